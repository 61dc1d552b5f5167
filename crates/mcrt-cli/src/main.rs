mod output;
mod progress;
mod utils;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use glam::UVec2;
use mcrt::{
    camera::{render_preview, Camera},
    octree::GpuOctree,
    pipeline::{
        DirectLightParams, GatherParams, GridParams, LightTransportPipeline, OctreeParams,
        PipelineParams, ScatterParams,
    },
    utils::{counter, progress::Progress, timer::timed_scope_log},
};
use output::{BakeOutputs, FileOutput, FinalOutput};
use progress::with_progress_bar;
use utils::{AvailableEncoding, AvailableScene, Dimensions};

#[derive(Parser, Debug)]
pub struct Args {
    #[arg(long, value_enum, default_value_t)]
    /// Scene selector
    scene: AvailableScene,

    #[arg(long)]
    /// Bake an OBJ file instead of a built-in scene. It is fitted in the unit cube and lit from
    /// above
    obj: Option<PathBuf>,

    #[arg(long, default_value_t = 4.0)]
    /// Power of the light added to OBJ scenes
    obj_light_power: f32,

    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    #[arg(short, long, default_value_t = 256)]
    /// Side of the square lightmaps, in texels
    texture_size: u32,

    #[arg(short, long, default_value_t = 2)]
    /// Indirect bounces after the direct light
    bounces: u32,

    #[arg(long, default_value_t = 0.25)]
    /// Side of the radiance grid cells, in world unit
    cell_size: f32,

    #[arg(long, value_enum, default_value_t)]
    encoding: AvailableEncoding,

    #[arg(long, default_value = "4x4")]
    /// Strata of the light area, in format `u`x`v`
    stratify: Dimensions,

    #[arg(long, default_value_t = 4)]
    samples_per_stratum: u32,

    #[arg(long, default_value_t = 256)]
    /// Hemisphere samples per SH sub-probe
    gather_samples: u32,

    #[arg(long, default_value_t = 8)]
    /// Resolution of a cubemap face
    cubemap_res: u32,

    #[arg(long, default_value_t = 64)]
    /// Hemisphere samples per texel of the scatter pass
    scatter_samples: u32,

    #[arg(long, default_value_t = 0.5)]
    /// Farthest surface a scatter ray reads, past it the probe of the cell is read
    scatter_range: f32,

    #[arg(long, default_value_t = 4)]
    octree_depth: u32,

    #[arg(long, default_value_t = 16)]
    /// Resolution of the indirection grid of the flat octree
    octree_res: u32,

    #[arg(long)]
    /// Skip the octree files
    no_octree: bool,

    #[arg(long)]
    /// Also write the flat octree as text
    octree_txt: bool,

    #[arg(long, conflicts_with = "no_octree")]
    /// Reuse a flat octree written by a previous run instead of building it
    octree_in: Option<PathBuf>,

    #[arg(long, default_value = "800x600")]
    /// Preview dimension in format `width`x`height`, 0x0 skips the preview
    preview: Dimensions,

    #[arg(long)]
    /// Worker threads, every core by default
    threads: Option<usize>,

    #[arg(long, default_value_t)]
    /// Seed to use for all the random stuff.
    /// Given a seed, the bake is deterministic (up to the float summation order of the SH probes).
    seed: u64,
}

impl Args {
    fn pipeline_params(&self) -> PipelineParams {
        PipelineParams {
            texture_size: self.texture_size,
            bounces: self.bounces,
            seed: self.seed,
            grid: GridParams {
                cell_size: self.cell_size,
            },
            octree: OctreeParams {
                max_depth: self.octree_depth,
                indirection_res: self.octree_res,
            },
            direct: DirectLightParams {
                stratify: UVec2::from(self.stratify),
                samples_per_stratum: self.samples_per_stratum,
                ..Default::default()
            },
            gather: GatherParams {
                encoding: self.encoding.into(),
                samples: self.gather_samples,
                cubemap_res: self.cubemap_res,
            },
            scatter: ScatterParams {
                samples: self.scatter_samples,
                range: self.scatter_range,
            },
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> Result<()> {
    log::info!("building thread pool");
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = threads {
        builder = builder.num_threads(threads);
    }
    builder.build_global()?;
    log::info!("{} worker threads", rayon::current_num_threads());
    Ok(())
}

/// The flat octree to write: none, the one at `octree_in`, or a freshly built one
fn resolve_octree(
    no_octree: bool,
    octree_in: Option<&Path>,
    build: impl FnOnce() -> Result<GpuOctree>,
) -> Result<Option<GpuOctree>> {
    if no_octree {
        return Ok(None);
    }
    match octree_in {
        Some(path) => {
            log::info!("reusing the octree of {}", path.display());
            GpuOctree::load_octree_from_file(path).map(Some)
        }
        None => build().map(Some),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    build_thread_pool(args.threads)?;

    log::info!("loading scene");
    let scene = match args.obj {
        Some(ref path) => utils::load_obj_scene(path, args.obj_light_power)?,
        None => args.scene.build(),
    };
    log::info!(
        "{} triangles, {} lights",
        scene.triangle_count(),
        scene.lights.len()
    );

    let pipeline = LightTransportPipeline::new(&scene, args.pipeline_params())?;

    let progress = Progress::new(pipeline.work_units());
    let bake = timed_scope_log("bake", || {
        with_progress_bar(&progress, || pipeline.run(Some(&progress)))
    })
    .res;

    let octree = resolve_octree(args.no_octree, args.octree_in.as_deref(), || {
        pipeline.octree()
    })?;

    let preview = match (bake.composite(), args.preview) {
        (Some(lightmap), Dimensions { width, height }) if width > 0 && height > 0 => {
            let camera = Camera::framing(
                &scene.bounds(),
                width,
                height,
                f32::to_radians(60.),
            );
            let progress = Progress::new((width * height) as usize);
            let image = timed_scope_log("preview", || {
                with_progress_bar(&progress, || {
                    render_preview(&camera, pipeline.tracer(), &lightmap, Some(&progress))
                })
            })
            .res;
            Some(image)
        }
        _ => None,
    };

    let outputs = BakeOutputs {
        bake,
        preview,
        octree,
    };
    let final_outputs: Vec<Box<dyn FinalOutput>> =
        vec![Box::new(FileOutput::new(args.output, args.octree_txt))];
    for final_output in final_outputs {
        final_output.commit(&outputs)?;
    }

    log::info!("Done");
    counter::report_counters();
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use mcrt::{grid::RadianceGrid, octree::OctreeBuilder};

    use super::resolve_octree;

    #[test]
    fn saved_octree_is_reused() {
        let grid = RadianceGrid::build(Vec3::ZERO, Vec3::ONE, 0.5).unwrap();
        let saved = OctreeBuilder::new(&grid, 3).build().serialize(1).unwrap();
        let path = std::env::temp_dir().join(format!("mcrt-cli-octree-{}.bin", std::process::id()));
        saved.save_octree_to_file(&path).unwrap();

        let reused = resolve_octree(false, Some(&path), || panic!("the octree is rebuilt"))
            .unwrap()
            .unwrap();
        assert_eq!(reused, saved);

        let built = resolve_octree(false, None, || Ok(saved.clone())).unwrap();
        assert_eq!(built, Some(saved));
        assert!(resolve_octree(true, Some(&path), || unreachable!())
            .unwrap()
            .is_none());

        std::fs::remove_file(&path).unwrap();
        assert!(resolve_octree(false, Some(&path), || unreachable!()).is_err());
    }
}
