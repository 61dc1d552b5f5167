//! Direct lighting, from the area lights to every texel.
use glam::Vec3;

use super::{
    launch::{launch_columns, LaunchDimensions},
    streams, DirectLightParams, PassContext,
};
use crate::{
    color::{linear, Rgb},
    math::distributions::Sample2D,
    scene::AreaLight,
    shape::IntersectionResult,
    texture::RadianceTexture,
    utils::counter::counter,
    uv_world::TexelRecord,
    Seed,
};

/// Radiance a light brings to a surface point through one light sample point.
///
/// The ray goes from the light to the texel: the texel is lit if it is the first thing the ray
/// hits. Lights have no distance falloff.
pub fn light_contribution(
    ctx: &PassContext,
    light: &AreaLight,
    light_point: Vec3,
    texel: &TexelRecord,
    hit_tolerance: f32,
) -> Rgb {
    let to_texel = texel.position - light_point;
    let distance = to_texel.length();
    if distance <= hit_tolerance {
        return linear::BLACK;
    }
    let direction = to_texel / distance;

    let cos_light = light.normal().dot(direction);
    let cos_surface = texel.normal.dot(-direction);
    if cos_light <= 0.0 || cos_surface <= 0.0 {
        return linear::BLACK;
    }

    counter!("Direct light rays");
    match ctx
        .tracer
        .trace(light_point, direction, 0.0, distance + hit_tolerance)
    {
        IntersectionResult::Intersection(record)
            if record.local_info.pos.distance(texel.position) <= hit_tolerance =>
        {
            (cos_surface * cos_light) * light.power
        }
        IntersectionResult::Intersection(_) => {
            counter!("Direct light rays in shadow");
            linear::BLACK
        }
        IntersectionResult::NoIntersection => {
            counter!("Direct light rays missing the scene");
            linear::BLACK
        }
    }
}

struct TexelState<'a> {
    record: Option<&'a TexelRecord>,
    rng: crate::Rng,
    sum: Rgb,
}

/// Launches one column per texel, its threads are the strata of the light area.
/// Every stratum gets `samples_per_stratum` jittered points on every light.
pub fn direct_pass(
    ctx: &PassContext,
    lights: &[AreaLight],
    params: &DirectLightParams,
) -> RadianceTexture {
    let size = ctx.uv_world.size();
    let dims = LaunchDimensions::new(
        ctx.uv_world.texel_count() as u32,
        params.stratify.x,
        params.stratify.y,
    );
    if lights.is_empty() {
        log::warn!("the scene has no light, the lightmaps are black");
    }

    let states = launch_columns(
        dims,
        ctx.progress,
        |x| TexelState {
            record: ctx.uv_world.by_index(x as usize),
            rng: Seed {
                seed: ctx.seed,
                launch_index: x,
                cell: 0,
            }
            .into_rng(streams::of(streams::DIRECT, 0)),
            sum: linear::BLACK,
        },
        |state, index| {
            let Some(record) = state.record else {
                return;
            };
            for _ in 0..params.samples_per_stratum {
                for light in lights {
                    let s = Sample2D::stratified(
                        index.y,
                        index.z,
                        params.stratify.x,
                        params.stratify.y,
                        &mut state.rng,
                    );
                    state.sum +=
                        light_contribution(ctx, light, light.point(s), record, params.hit_tolerance);
                }
            }
        },
    );

    let n = params.samples_per_light() as f32;
    let texels = states
        .into_iter()
        .map(|state| {
            let record = state.record?;
            Some(record.diffuse * (state.sum / n))
        })
        .collect();
    RadianceTexture::from_texels(size, texels)
}
