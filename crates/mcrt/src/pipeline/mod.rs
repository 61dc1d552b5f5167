//! The bake: a direct pass, then a gather and a scatter pass per indirect bounce.
//!
//! Passes run one after the other. Each pass reads the texture of the previous bounce and
//! produces a new one, textures are never modified once produced.
pub mod direct;
pub mod gather;
pub mod launch;
pub mod params;
pub mod scatter;

use anyhow::Result;
use log::info;

pub use params::{
    DirectLightParams, GatherParams, GridParams, OctreeParams, PipelineParams, ScatterParams,
};

use crate::{
    aggregate::Bvh,
    grid::RadianceGrid,
    octree::{GpuOctree, OctreeBuilder},
    probe::ProbeStore,
    scene::Scene,
    shape::Shape,
    texture::RadianceTexture,
    utils::{progress::Progress, timer::timed_scope_log},
    uv_world::UvWorldData,
};

/// Everything a pass reads. Shared by every thread of a launch.
pub struct PassContext<'a> {
    pub tracer: &'a dyn Shape,
    pub uv_world: &'a UvWorldData,
    pub grid: &'a RadianceGrid,
    pub seed: u64,
    pub progress: Option<&'a Progress>,
}

/// Random streams of the passes, mixed into the thread seeds
pub(crate) mod streams {
    pub const DIRECT: u32 = 0;
    pub const GATHER: u32 = 1;
    pub const SCATTER: u32 = 2;

    /// Stream of a pass for a given bounce
    pub fn of(pass: u32, bounce: u32) -> u32 {
        bounce * 3 + pass
    }
}

/// Textures and probes of a bake
#[derive(Debug, Default)]
pub struct Bake {
    /// Outgoing radiance per bounce: direct light first
    pub bounces: Vec<RadianceTexture>,
    /// Probes gathered for each indirect bounce
    pub probes: Vec<ProbeStore>,
}

impl Bake {
    /// The final lightmap, sum of every bounce
    pub fn composite(&self) -> Option<RadianceTexture> {
        let size = self.bounces.first()?.size();
        Some(RadianceTexture::sum(size, &self.bounces))
    }
}

pub struct LightTransportPipeline<'a> {
    scene: &'a Scene,
    tracer: Bvh,
    uv_world: UvWorldData,
    grid: RadianceGrid,
    params: PipelineParams,
}

impl<'a> LightTransportPipeline<'a> {
    /// Validates the parameters and builds the structures the passes share
    pub fn new(scene: &'a Scene, params: PipelineParams) -> Result<Self> {
        params.validate()?;

        let tracer = timed_scope_log("building BVH", || scene.build_tracer()).res;
        let uv_world = timed_scope_log("mapping texels to the surface", || {
            UvWorldData::build(scene, params.texture_size)
        })
        .res;
        let grid = timed_scope_log("building radiance grid", || {
            RadianceGrid::from_scene(scene, &uv_world, params.grid.cell_size)
        })
        .res?;
        info!(
            "{} texels on the surface, {} non-empty cells of {}",
            uv_world.covered_count(),
            grid.non_empty_count(),
            grid.cell_count()
        );

        Ok(Self {
            scene,
            tracer,
            uv_world,
            grid,
            params,
        })
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn tracer(&self) -> &Bvh {
        &self.tracer
    }

    pub fn grid(&self) -> &RadianceGrid {
        &self.grid
    }

    pub fn uv_world(&self) -> &UvWorldData {
        &self.uv_world
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Work units of a whole bake, the unit of the progress reported by [Self::run]
    pub fn work_units(&self) -> usize {
        let cells = self.grid.non_empty_count();
        let scatter_texels: usize = self.grid.non_empty_cells().map(|c| c.texels.len()).sum();
        self.uv_world.texel_count() + self.params.bounces as usize * (cells + scatter_texels)
    }

    fn context<'s>(&'s self, progress: Option<&'s Progress>) -> PassContext<'s> {
        PassContext {
            tracer: &self.tracer,
            uv_world: &self.uv_world,
            grid: &self.grid,
            seed: self.params.seed,
            progress,
        }
    }

    /// Runs the direct pass then every indirect bounce
    pub fn run(&self, progress: Option<&Progress>) -> Bake {
        if self.params.texture_size == 0 {
            info!("lightmap size is zero, nothing to bake");
            return Bake::default();
        }
        let ctx = self.context(progress);

        let direct = timed_scope_log("direct lighting", || {
            direct::direct_pass(&ctx, &self.scene.lights, &self.params.direct)
        })
        .res;
        let mut bake = Bake {
            bounces: vec![direct],
            probes: Vec::new(),
        };

        for bounce in 1..=self.params.bounces {
            let Some(previous) = bake.bounces.last() else {
                break;
            };
            let probes = timed_scope_log(&format!("gather, bounce {bounce}"), || {
                gather::gather_pass(&ctx, previous, &self.params.gather, bounce)
            })
            .res;
            let texture = timed_scope_log(&format!("scatter, bounce {bounce}"), || {
                scatter::scatter_pass(&ctx, previous, &probes, &self.params.scatter, bounce)
            })
            .res;
            bake.probes.push(probes);
            bake.bounces.push(texture);
        }

        bake
    }

    /// The occupancy of the grid as a flat octree
    pub fn octree(&self) -> Result<GpuOctree> {
        let params = &self.params.octree;
        let octree = timed_scope_log("building octree", || {
            OctreeBuilder::new(&self.grid, params.max_depth).build()
        })
        .res;
        octree.serialize(params.indirection_res)
    }
}

#[cfg(test)]
mod tests {
    use super::{LightTransportPipeline, PipelineParams};
    use crate::scene::{examples::FloorOccluderScene, Scene};

    #[test]
    fn zero_sized_texture_bakes_nothing() {
        let scene = FloorOccluderScene::build();
        let params = PipelineParams {
            texture_size: 0,
            ..Default::default()
        };
        let pipeline = LightTransportPipeline::new(&scene, params).unwrap();
        let bake = pipeline.run(None);
        assert!(bake.bounces.is_empty());
        assert!(bake.composite().is_none());
    }

    #[test]
    fn invalid_params_or_empty_scene_fail_early() {
        let scene = FloorOccluderScene::build();
        let mut params = PipelineParams::default();
        params.scatter.samples = 0;
        assert!(LightTransportPipeline::new(&scene, params).is_err());

        let empty = Scene::new();
        assert!(LightTransportPipeline::new(&empty, PipelineParams::default()).is_err());
    }

    #[test]
    fn octree_of_the_scene() {
        let scene = FloorOccluderScene::build();
        let params = PipelineParams {
            texture_size: 16,
            ..Default::default()
        };
        let pipeline = LightTransportPipeline::new(&scene, params).unwrap();
        let octree = pipeline.octree().unwrap();
        assert!(octree.block_count() > 1);
    }
}
