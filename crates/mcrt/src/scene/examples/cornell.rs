use glam::Vec3;

use super::{atlas_chart, quad};
use crate::{
    color::Rgb,
    scene::{AreaLight, Scene},
    texture::Uniform,
};

/// An open Cornell box: white floor, ceiling and back wall, a red wall at x = 0, a green
/// wall at x = 1, and a light just under the ceiling.
pub struct CornellBox;

impl CornellBox {
    pub const LIGHT_POWER: f32 = 4.0;

    pub fn build() -> Scene {
        let mut scene = Scene::new();
        let white = scene.insert_material(Some("white".to_owned()), Uniform(Rgb::splat(0.75)));
        let red = scene.insert_material(
            Some("red".to_owned()),
            Uniform(Rgb::from_array([0.75, 0.1, 0.1])),
        );
        let green = scene.insert_material(
            Some("green".to_owned()),
            Uniform(Rgb::from_array([0.1, 0.75, 0.1])),
        );

        let chart = |i| atlas_chart(i, 3, 2, 1.0 / 64.0);

        scene.insert_mesh(quad("floor", Vec3::ZERO, Vec3::Z, Vec3::X, chart(0), white));
        scene.insert_mesh(quad("ceiling", Vec3::Y, Vec3::X, Vec3::Z, chart(1), white));
        scene.insert_mesh(quad("back", Vec3::Z, Vec3::Y, Vec3::X, chart(2), white));
        scene.insert_mesh(quad("left", Vec3::ZERO, Vec3::Y, Vec3::Z, chart(3), red));
        scene.insert_mesh(quad("right", Vec3::X, Vec3::Z, Vec3::Y, chart(4), green));

        scene.insert_light(AreaLight {
            label: Some("ceiling light".to_owned()),
            corner: Vec3::new(0.4, 0.99, 0.4),
            edge_u: 0.2 * Vec3::X,
            edge_v: 0.2 * Vec3::Z,
            power: Rgb::splat(Self::LIGHT_POWER),
        });

        scene
    }
}
