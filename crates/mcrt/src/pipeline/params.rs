//! Explicit, validated parameters of every pass.
use anyhow::{ensure, Result};
use glam::UVec2;

use crate::probe::ProbeEncoding;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    /// Side of a cell, in world units
    pub cell_size: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self { cell_size: 0.25 }
    }
}

impl GridParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.cell_size.is_finite() && self.cell_size > 0.0,
            "cell size must be positive, got {}",
            self.cell_size
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctreeParams {
    pub max_depth: u32,
    /// Resolution of the indirection grid, in 2x2x2 blocks per axis
    pub indirection_res: u32,
}

impl Default for OctreeParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            indirection_res: 16,
        }
    }
}

impl OctreeParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.indirection_res > 0, "indirection grid resolution must be positive");
        ensure!(
            self.max_depth <= 16,
            "octree depth {} is too deep",
            self.max_depth
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectLightParams {
    /// Strata of the light area
    pub stratify: UVec2,
    pub samples_per_stratum: u32,
    /// Distance under which a light ray hit is the texel itself
    pub hit_tolerance: f32,
}

impl Default for DirectLightParams {
    fn default() -> Self {
        Self {
            stratify: UVec2::new(4, 4),
            samples_per_stratum: 4,
            hit_tolerance: 1e-3,
        }
    }
}

impl DirectLightParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.stratify.x > 0 && self.stratify.y > 0,
            "stratify grid must not be empty, got {}x{}",
            self.stratify.x,
            self.stratify.y
        );
        ensure!(self.samples_per_stratum > 0, "at least one sample per stratum");
        ensure!(self.hit_tolerance > 0.0, "hit tolerance must be positive");
        Ok(())
    }

    pub fn samples_per_light(&self) -> u32 {
        self.stratify.x * self.stratify.y * self.samples_per_stratum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherParams {
    pub encoding: ProbeEncoding,
    /// Hemisphere rays per spherical harmonics sub-probe
    pub samples: u32,
    /// Face resolution of the cubemaps
    pub cubemap_res: u32,
}

impl Default for GatherParams {
    fn default() -> Self {
        Self {
            encoding: ProbeEncoding::SphericalHarmonics,
            samples: 256,
            cubemap_res: 8,
        }
    }
}

impl GatherParams {
    pub fn validate(&self) -> Result<()> {
        match self.encoding {
            ProbeEncoding::SphericalHarmonics => {
                ensure!(self.samples > 0, "at least one gather sample per sub-probe")
            }
            ProbeEncoding::Cubemap => ensure!(self.cubemap_res > 0, "cubemap resolution must be positive"),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterParams {
    /// Hemisphere rays per texel
    pub samples: u32,
    /// Rays missing the geometry within this distance read the probes
    pub range: f32,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            samples: 64,
            range: 0.5,
        }
    }
}

impl ScatterParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.samples > 0, "at least one scatter sample per texel");
        ensure!(
            self.range > 0.0,
            "scatter range must be positive, got {}",
            self.range
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    /// Side of the square lightmaps, in texels. A zero sized lightmap bakes nothing
    pub texture_size: u32,
    /// Indirect bounces after the direct pass
    pub bounces: u32,
    pub seed: u64,
    pub grid: GridParams,
    pub octree: OctreeParams,
    pub direct: DirectLightParams,
    pub gather: GatherParams,
    pub scatter: ScatterParams,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            texture_size: 256,
            bounces: 2,
            seed: 0,
            grid: Default::default(),
            octree: Default::default(),
            direct: Default::default(),
            gather: Default::default(),
            scatter: Default::default(),
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.octree.validate()?;
        self.direct.validate()?;
        self.gather.validate()?;
        self.scatter.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineParams::default().validate().unwrap();
        PipelineParams {
            texture_size: 0,
            bounces: 0,
            ..Default::default()
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut p = PipelineParams::default();
        p.grid.cell_size = -1.0;
        assert!(p.validate().is_err());

        let mut p = PipelineParams::default();
        p.direct.stratify = UVec2::new(0, 3);
        assert!(p.validate().is_err());

        let mut p = PipelineParams::default();
        p.gather.encoding = ProbeEncoding::Cubemap;
        p.gather.cubemap_res = 0;
        assert!(p.validate().is_err());
        p.gather.encoding = ProbeEncoding::SphericalHarmonics;
        assert!(p.validate().is_ok());

        let mut p = PipelineParams::default();
        p.scatter.range = 0.0;
        assert!(p.validate().is_err());
    }
}
