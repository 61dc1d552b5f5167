use core::fmt::Display;
use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;
use glam::{UVec2, Vec3};
use mcrt::{
    color::Rgb,
    loader::ObjLoaderExt,
    math::transform::Transform,
    probe::ProbeEncoding,
    scene::{
        examples::{CornellBox, FloorOccluderScene},
        AreaLight, MaterialId, Scene,
    },
};

#[derive(Debug, Default, Clone, Copy, ValueEnum)]
pub enum AvailableScene {
    #[default]
    CornellBox,
    Debug,
}

impl AvailableScene {
    pub fn build(self) -> Scene {
        match self {
            AvailableScene::CornellBox => CornellBox::build(),
            AvailableScene::Debug => FloorOccluderScene::build(),
        }
    }
}

/// Loads an OBJ file, fitted in the unit cube, lit by a square light under the top of the cube
pub fn load_obj_scene(path: &Path, light_power: f32) -> Result<Scene> {
    let mut scene = Scene::new();
    scene.load_obj(path, Transform::IDENTITY, MaterialId(0))?;
    scene.normalize();
    scene.insert_light(AreaLight {
        label: Some("Ceiling light".to_owned()),
        corner: Vec3::new(0.35, 0.99, 0.35),
        edge_u: 0.3 * Vec3::X,
        edge_v: 0.3 * Vec3::Z,
        power: Rgb::splat(light_power),
    });
    Ok(scene)
}

#[derive(Default, Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
pub enum AvailableEncoding {
    #[default]
    Sh,
    Cubemap,
}

impl From<AvailableEncoding> for ProbeEncoding {
    fn from(val: AvailableEncoding) -> Self {
        match val {
            AvailableEncoding::Sh => ProbeEncoding::SphericalHarmonics,
            AvailableEncoding::Cubemap => ProbeEncoding::Cubemap,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for UVec2 {
    fn from(val: Dimensions) -> Self {
        UVec2::new(val.width, val.height)
    }
}

impl std::str::FromStr for Dimensions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut split_it = s.split('x');
        let (Some(a), Some(b), None) = (split_it.next(), split_it.next(), split_it.next()) else {
            return Err(anyhow::anyhow!("Incorrect format, see help"));
        };
        let width: u32 = a.parse()?;
        let height: u32 = b.parse()?;

        Ok(Dimensions { width, height })
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}x{}", self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::Dimensions;

    #[test]
    fn parse_dimensions() {
        let d: Dimensions = "4x3".parse().unwrap();
        assert_eq!(
            d,
            Dimensions {
                width: 4,
                height: 3
            }
        );
        assert_eq!(d.to_string(), "4x3");
        assert!("4".parse::<Dimensions>().is_err());
        assert!("4x3x2".parse::<Dimensions>().is_err());
        assert!("ax3".parse::<Dimensions>().is_err());
    }
}
