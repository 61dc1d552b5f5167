//! Scatter: every texel collects the radiance of its surroundings, from the nearby surfaces
//! and, past the tracing range, from the probe of its cell.
use std::f32::consts::PI;

use glam::UVec2;

use super::{
    launch::{launch_columns, LaunchDimensions},
    streams, PassContext, ScatterParams,
};
use crate::{
    color::{linear, Rgb},
    math::{
        distributions::{CosineHemisphere3, Samplable, Sample2D},
        transform::Frame,
    },
    probe::{sub_probe_index, ProbeStore},
    ray::Ray,
    shape::IntersectionResult,
    texture::RadianceTexture,
    utils::{counter::counter, timer::timed_scope_accumulate},
    uv_world::TexelRecord,
    Seed,
};

struct ScatterTexel<'a> {
    slot: u32,
    sub_probe: usize,
    texel: UVec2,
    record: &'a TexelRecord,
}

struct ScatterState {
    rng: crate::Rng,
    sum: Rgb,
}

/// One column per texel of every non-empty cell, one thread per hemisphere sample.
///
/// The sum of the cosine weighted samples is normalized by `1 / (N * 2 pi)` and multiplied by
/// the diffuse albedo.
pub fn scatter_pass(
    ctx: &PassContext,
    previous: &RadianceTexture,
    probes: &ProbeStore,
    params: &ScatterParams,
    bounce: u32,
) -> RadianceTexture {
    let work: Vec<ScatterTexel> = ctx
        .grid
        .non_empty_cells()
        .enumerate()
        .flat_map(|(slot, cell)| {
            cell.texels.iter().filter_map(move |&texel| {
                let record = ctx.uv_world.get(texel)?;
                Some(ScatterTexel {
                    slot: slot as u32,
                    sub_probe: sub_probe_index(cell.center(), record.position),
                    texel,
                    record,
                })
            })
        })
        .collect();
    let dims = LaunchDimensions::new(work.len() as u32, params.samples, 1);

    let states = launch_columns(
        dims,
        ctx.progress,
        |x| ScatterState {
            rng: Seed {
                seed: ctx.seed,
                launch_index: x,
                cell: work[x as usize].slot,
            }
            .into_rng(streams::of(streams::SCATTER, bounce)),
            sum: linear::BLACK,
        },
        |state, index| {
            let item = &work[index.x as usize];
            let record = item.record;
            let s = Sample2D::stratified_index(index.y, params.samples, &mut state.rng);
            let direction = Frame::new(record.normal).from_local(CosineHemisphere3.sample_with(s));
            let cos = direction.dot(record.normal).max(0.0);

            counter!("Scatter rays");
            let ray = Ray::from_surface(record.position, record.normal, direction, params.range);
            let radiance = match ctx.tracer.intersection_full(ray) {
                IntersectionResult::Intersection(hit) => previous.sample(hit.local_info.uv),
                IntersectionResult::NoIntersection => {
                    counter!("Scatter rays reading a probe");
                    timed_scope_accumulate!("Probe lookups", || {
                        probes.lookup(item.slot, item.sub_probe, direction)
                    })
                }
            };
            state.sum += cos * radiance;
        },
    );

    let mut texture = RadianceTexture::new(ctx.uv_world.size());
    let normalization = 1.0 / (params.samples as f32 * 2.0 * PI);
    for (item, state) in work.iter().zip(states) {
        texture.set(item.texel, item.record.diffuse * (normalization * state.sum));
    }
    texture
}
