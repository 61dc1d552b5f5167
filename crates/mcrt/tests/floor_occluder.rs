use glam::{UVec2, Vec3};
use mcrt::{
    pipeline::{GatherParams, LightTransportPipeline, PipelineParams, ScatterParams},
    probe::ProbeEncoding,
    scene::examples::FloorOccluderScene,
    uv_world::UvWorldData,
};

/// Floor texel closest to `target`
fn floor_texel(uv_world: &UvWorldData, target: Vec3) -> UVec2 {
    uv_world
        .iter()
        .filter(|(_, record)| record.normal.dot(Vec3::Y) > 0.99 && record.position.y.abs() < 1e-4)
        .min_by(|(_, a), (_, b)| {
            a.position
                .distance(target)
                .total_cmp(&b.position.distance(target))
        })
        .map(|(texel, _)| texel)
        .unwrap()
}

fn params(encoding: ProbeEncoding, bounces: u32) -> PipelineParams {
    PipelineParams {
        texture_size: 64,
        bounces,
        seed: 42,
        gather: GatherParams {
            encoding,
            samples: 64,
            cubemap_res: 4,
        },
        scatter: ScatterParams {
            samples: 32,
            range: 0.5,
        },
        ..Default::default()
    }
}

#[test]
fn direct_light_and_shadow() {
    let scene = FloorOccluderScene::build();
    let pipeline =
        LightTransportPipeline::new(&scene, params(ProbeEncoding::SphericalHarmonics, 0)).unwrap();
    assert_eq!(pipeline.grid().cell_size(), 0.25);

    let bake = pipeline.run(None);
    assert_eq!(bake.bounces.len(), 1);
    assert!(bake.probes.is_empty());
    let direct = &bake.bounces[0];

    let shadowed = floor_texel(pipeline.uv_world(), Vec3::new(0.15, 0.0, 0.15));
    assert!(direct.get(shadowed).is_black());

    // Both cosines are above 0.99 right under the light
    let lit = floor_texel(pipeline.uv_world(), Vec3::new(0.5, 0.0, 0.5));
    let expected = FloorOccluderScene::LIGHT_POWER * FloorOccluderScene::ALBEDO;
    let value = direct.get(lit).to_array()[0];
    assert!(value <= expected * 1.001, "{value}");
    assert!(value >= expected * 0.98, "{value}");
}

#[test]
fn indirect_light_reaches_the_shadow() {
    for encoding in [ProbeEncoding::SphericalHarmonics, ProbeEncoding::Cubemap] {
        let scene = FloorOccluderScene::build();
        let pipeline = LightTransportPipeline::new(&scene, params(encoding, 2)).unwrap();
        let bake = pipeline.run(None);
        assert_eq!(bake.bounces.len(), 3);
        assert_eq!(bake.probes.len(), 2);
        assert!(bake.probes.iter().all(|p| p.encoding() == encoding));
        assert!(bake
            .probes
            .iter()
            .all(|p| p.cell_count() == pipeline.grid().non_empty_count()));

        let shadowed = floor_texel(pipeline.uv_world(), Vec3::new(0.15, 0.0, 0.15));
        let indirect = bake.bounces[1].get(shadowed);
        assert!(indirect.to_array()[0] > 0.0, "{encoding}: {indirect:?}");

        let composite = bake.composite().unwrap();
        for (texel, _) in pipeline.uv_world().iter() {
            let total = composite.get(texel).to_array()[0];
            let direct = bake.bounces[0].get(texel).to_array()[0];
            assert!(total >= direct, "{encoding}: {texel}");
        }
    }
}

#[test]
fn bakes_are_reproducible() {
    // Cubemap bakes do not go through the atomic SH accumulation: they are bit exact
    let scene = FloorOccluderScene::build();
    let a = LightTransportPipeline::new(&scene, params(ProbeEncoding::Cubemap, 1))
        .unwrap()
        .run(None);
    let b = LightTransportPipeline::new(&scene, params(ProbeEncoding::Cubemap, 1))
        .unwrap()
        .run(None);
    assert_eq!(a.bounces, b.bounces);

    let mut other_seed = params(ProbeEncoding::Cubemap, 1);
    other_seed.seed = 7;
    let c = LightTransportPipeline::new(&scene, other_seed)
        .unwrap()
        .run(None);
    assert_ne!(a.bounces[1], c.bounces[1]);
}
