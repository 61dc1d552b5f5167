use glam::{Vec2, Vec3};

use super::quad;
use crate::{
    color::Rgb,
    scene::{AreaLight, Scene},
    texture::Uniform,
};

/// A floor, a ceiling and a square occluder hanging between the floor and a small
/// downward facing light, all in the unit cube.
///
/// Floor points under the occluder, around `(0.15, 0, 0.15)`, are in full shadow.
/// Floor points right under the light, around `(0.5, 0, 0.5)`, see all of it.
pub struct FloorOccluderScene;

impl FloorOccluderScene {
    pub const LIGHT_POWER: f32 = 1.0;
    pub const ALBEDO: f32 = 0.8;
    pub const OCCLUDER_HEIGHT: f32 = 0.5;

    pub fn build() -> Scene {
        let mut scene = Scene::new();
        let grey = scene.insert_material(
            Some("grey".to_owned()),
            Uniform(Rgb::splat(Self::ALBEDO)),
        );

        let chart = |i: u32| {
            let min = Vec2::new((i % 2) as f32, (i / 2) as f32) * 0.5;
            (min, min + Vec2::splat(0.5))
        };

        scene.insert_mesh(quad("floor", Vec3::ZERO, Vec3::Z, Vec3::X, chart(0), grey));
        scene.insert_mesh(quad(
            "ceiling",
            Vec3::Y,
            Vec3::X,
            Vec3::Z,
            chart(1),
            grey,
        ));
        scene.insert_mesh(quad(
            "occluder",
            Vec3::new(0.05, Self::OCCLUDER_HEIGHT, 0.05),
            0.35 * Vec3::Z,
            0.35 * Vec3::X,
            chart(2),
            grey,
        ));

        scene.insert_light(AreaLight {
            label: Some("light".to_owned()),
            corner: Vec3::new(0.45, 0.95, 0.45),
            edge_u: 0.1 * Vec3::X,
            edge_v: 0.1 * Vec3::Z,
            power: Rgb::splat(Self::LIGHT_POWER),
        });

        scene
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::FloorOccluderScene;
    use crate::shape::Shape;

    #[test]
    fn light_faces_the_floor() {
        let scene = FloorOccluderScene::build();
        assert!((scene.lights[0].normal() - Vec3::NEG_Y).length() < 1e-6);
        assert_eq!(scene.triangle_count(), 6);
    }

    #[test]
    fn occluder_blocks_the_light() {
        let scene = FloorOccluderScene::build();
        let tracer = scene.build_tracer();
        let light = scene.lights[0].center();
        let shadowed = Vec3::new(0.15, 0.0, 0.15);

        let hit = tracer.trace(light, shadowed - light, 0.0, f32::INFINITY);
        let crate::shape::IntersectionResult::Intersection(record) = hit else {
            panic!("the ray should hit the occluder");
        };
        assert!((record.local_info.pos.y - FloorOccluderScene::OCCLUDER_HEIGHT).abs() < 1e-4);
    }
}
