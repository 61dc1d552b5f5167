//! Gather: the probes collect the radiance the previous bounce left on the surfaces.
use glam::UVec2;

use super::{
    launch::{launch, launch_columns, LaunchDimensions},
    streams, GatherParams, PassContext,
};
use crate::{
    color::linear,
    grid::Cell,
    math::{
        distributions::{Samplable, Sample2D, UniformHemisphere3},
        transform::Frame,
    },
    probe::{
        cubemap::{texel_direction, FACES},
        sub_probe_index, CubemapProbes, ProbeEncoding, ProbeStore, ShAccumulator, ShProbes,
        SUB_PROBES,
    },
    ray::Ray,
    shape::IntersectionResult,
    texture::RadianceTexture,
    utils::counter::counter,
    uv_world::TexelRecord,
    Seed,
};

pub fn gather_pass(
    ctx: &PassContext,
    previous: &RadianceTexture,
    params: &GatherParams,
    bounce: u32,
) -> ProbeStore {
    match params.encoding {
        ProbeEncoding::SphericalHarmonics => {
            ProbeStore::SphericalHarmonics(gather_sh(ctx, previous, params.samples, bounce))
        }
        ProbeEncoding::Cubemap => {
            ProbeStore::Cubemap(gather_cubemap(ctx, previous, params.cubemap_res, bounce))
        }
    }
}

/// Surface records of the texels of every non-empty cell, split by sub-probe, in slot order
pub fn sub_probe_texels<'a>(ctx: &PassContext<'a>) -> Vec<[Vec<&'a TexelRecord>; SUB_PROBES]> {
    let uv_world = ctx.uv_world;
    ctx.grid
        .non_empty_cells()
        .map(|cell| {
            let mut split: [Vec<&TexelRecord>; SUB_PROBES] = Default::default();
            for record in cell.texels.iter().filter_map(|&t| uv_world.get(t)) {
                split[sub_probe_index(cell.center(), record.position)].push(record);
            }
            split
        })
        .collect()
}

/// Every sub-probe traces `samples` stratified hemisphere rays, leaving from its texels in
/// turn. Rays hitting a surface bring the radiance of the previous bounce at the hit.
pub fn gather_sh(
    ctx: &PassContext,
    previous: &RadianceTexture,
    samples: u32,
    bounce: u32,
) -> ShProbes {
    let texels = sub_probe_texels(ctx);
    let accumulator = ShAccumulator::new(texels.len());
    let dims = LaunchDimensions::new(texels.len() as u32, SUB_PROBES as u32, samples);

    launch(dims, ctx.progress, |index| {
        let sub_probe = index.y as usize;
        let candidates = &texels[index.x as usize][sub_probe];
        if candidates.is_empty() {
            return;
        }
        let record = candidates[index.z as usize % candidates.len()];

        let mut rng = Seed {
            seed: ctx.seed,
            launch_index: index.local(dims),
            cell: index.x,
        }
        .into_rng(streams::of(streams::GATHER, bounce));
        let s = Sample2D::stratified_index(index.z, samples, &mut rng);
        let direction = Frame::new(record.normal).from_local(UniformHemisphere3.sample_with(s));

        counter!("Gather rays");
        let ray = Ray::from_surface(record.position, record.normal, direction, f32::INFINITY);
        match ctx.tracer.intersection_full(ray) {
            IntersectionResult::Intersection(hit) => accumulator.add_sample(
                index.x,
                sub_probe,
                direction,
                previous.sample(hit.local_info.uv),
            ),
            IntersectionResult::NoIntersection => {
                counter!("Gather rays leaving the scene");
            }
        }
    });

    accumulator.finalize()
}

/// Every cubemap texel traces one ray from the cell center
pub fn gather_cubemap(
    ctx: &PassContext,
    previous: &RadianceTexture,
    res: u32,
    bounce: u32,
) -> CubemapProbes {
    let cells: Vec<&Cell> = ctx.grid.non_empty_cells().collect();
    let dims = LaunchDimensions::new(cells.len() as u32, res * res, FACES as u32);
    log::trace!("cubemap gather of bounce {bounce}");

    let faces = launch_columns(
        dims,
        ctx.progress,
        |_| Vec::with_capacity(FACES * (res * res) as usize),
        |texels, index| {
            let center = cells[index.x as usize].center();
            let texel = UVec2::new(index.y % res, index.y / res);
            let direction = texel_direction(index.z as usize, texel, res);

            counter!("Gather rays");
            let radiance = match ctx.tracer.trace(center, direction, 0.0, f32::INFINITY) {
                IntersectionResult::Intersection(hit) => previous.sample(hit.local_info.uv),
                IntersectionResult::NoIntersection => linear::BLACK,
            };
            texels.push(radiance);
        },
    );

    CubemapProbes::from_cells(res, faces)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use glam::{UVec2, Vec3};

    use super::{gather_cubemap, gather_sh};
    use crate::{
        aggregate::{Bvh, ShapeList},
        color::Rgb,
        grid::RadianceGrid,
        pipeline::PassContext,
        probe::{cubemap::FACES, SUB_PROBES},
        scene::{examples::FloorOccluderScene, Scene},
        texture::RadianceTexture,
        uv_world::UvWorldData,
    };

    fn white(size: u32) -> RadianceTexture {
        RadianceTexture::from_texels(size, vec![Some(Rgb::splat(1.0)); (size * size) as usize])
    }

    #[test]
    fn cubemaps_without_geometry_are_black() {
        let tracer = Bvh::from_shapelist(ShapeList::default());
        let uv_world = UvWorldData::build(&Scene::new(), 4);
        let mut grid = RadianceGrid::build(Vec3::ZERO, Vec3::ONE, 0.5).unwrap();
        grid.assign_uv_to_cells(UVec2::new(0, 0), Vec3::splat(0.1));
        grid.assign_uv_to_cells(UVec2::new(1, 0), Vec3::splat(0.9));
        let ctx = PassContext {
            tracer: &tracer,
            uv_world: &uv_world,
            grid: &grid,
            seed: 0,
            progress: None,
        };

        let probes = gather_cubemap(&ctx, &white(4), 4, 1);
        assert_eq!(probes.cell_count(), 2);
        for slot in 0..2 {
            for face in 0..FACES {
                for y in 0..4 {
                    for x in 0..4 {
                        assert!(probes.get(slot, face, UVec2::new(x, y)).is_black());
                    }
                }
            }
        }
    }

    #[test]
    fn cubemaps_see_the_lit_surfaces() {
        let scene = FloorOccluderScene::build();
        let tracer = scene.build_tracer();
        let uv_world = UvWorldData::build(&scene, 16);
        let grid = RadianceGrid::from_scene(&scene, &uv_world, 0.25).unwrap();
        let ctx = PassContext {
            tracer: &tracer,
            uv_world: &uv_world,
            grid: &grid,
            seed: 0,
            progress: None,
        };

        let probes = gather_cubemap(&ctx, &white(16), 2, 1);
        // Cells of the floor row see the floor below them
        let mut checked = 0;
        for slot in 0..grid.non_empty_count() as u32 {
            if grid.slot_cell(slot).unwrap().coord.y == 0 {
                assert_eq!(probes.lookup(slot, Vec3::NEG_Y), Rgb::splat(1.0));
                checked += 1;
            }
        }
        assert_eq!(checked, 16);
    }

    #[test]
    fn sh_gather_of_a_white_scene() {
        let scene = FloorOccluderScene::build();
        let tracer = scene.build_tracer();
        let uv_world = UvWorldData::build(&scene, 16);
        let grid = RadianceGrid::from_scene(&scene, &uv_world, 0.25).unwrap();
        let ctx = PassContext {
            tracer: &tracer,
            uv_world: &uv_world,
            grid: &grid,
            seed: 3,
            progress: None,
        };

        let probes = gather_sh(&ctx, &white(16), 16, 1);
        let texels = super::sub_probe_texels(&ctx);
        assert_eq!(probes.cell_count(), grid.non_empty_count());

        let mut gathered = 0;
        for (slot, split) in texels.iter().enumerate() {
            for sub_probe in 0..SUB_PROBES {
                let n = probes.sample_count(slot as u32, sub_probe);
                assert!(n <= 16);
                if split[sub_probe].is_empty() || n == 0 {
                    assert!(probes.coefficient(slot as u32, sub_probe, 0).is_black());
                    continue;
                }
                gathered += 1;
                // Every hit brings 1: the DC term is Y00 / 4 pi
                let dc = probes.coefficient(slot as u32, sub_probe, 0).to_array()[0];
                assert!((dc - 0.282095 / (4.0 * PI)).abs() < 1e-5, "{dc}");
            }
        }
        assert!(gathered > 0);
    }
}
