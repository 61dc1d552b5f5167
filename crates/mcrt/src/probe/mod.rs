//! Per cell radiance, stored either as spherical harmonics or as cubemaps.
//!
//! Probes are addressed by the slot of their cell, see [crate::grid::RadianceGrid].
pub mod cubemap;
pub mod sh;

use glam::Vec3;

pub use cubemap::CubemapProbes;
pub use sh::{ShAccumulator, ShProbes};

use crate::{
    color::{linear, Rgb},
    utils::log_once::error_once,
};

/// Sub-probes per cell, one per octant
pub const SUB_PROBES: usize = 8;

/// Sub-probe of the octant of `p` in a cell centered on `center`.
/// Bit 0 is +x, bit 1 is +y, bit 2 is +z.
pub fn sub_probe_index(center: Vec3, p: Vec3) -> usize {
    (p.x >= center.x) as usize | ((p.y >= center.y) as usize) << 1 | ((p.z >= center.z) as usize) << 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum ProbeEncoding {
    #[default]
    #[display("spherical harmonics")]
    SphericalHarmonics,
    #[display("cubemap")]
    Cubemap,
}

/// The probes of one bounce
#[derive(Debug, Clone)]
pub enum ProbeStore {
    SphericalHarmonics(ShProbes),
    Cubemap(CubemapProbes),
}

impl ProbeStore {
    pub fn encoding(&self) -> ProbeEncoding {
        match self {
            ProbeStore::SphericalHarmonics(_) => ProbeEncoding::SphericalHarmonics,
            ProbeStore::Cubemap(_) => ProbeEncoding::Cubemap,
        }
    }

    pub fn cell_count(&self) -> usize {
        match self {
            ProbeStore::SphericalHarmonics(p) => p.cell_count(),
            ProbeStore::Cubemap(p) => p.cell_count(),
        }
    }

    /// Radiance arriving in the cell in `slot` from `direction`.
    ///
    /// `sub_probe` is only used by the spherical harmonics, cubemaps have one probe per cell.
    pub fn lookup(&self, slot: u32, sub_probe: usize, direction: Vec3) -> Rgb {
        if slot as usize >= self.cell_count() {
            error_once!("probe lookup in slot {slot}, only {} cells", self.cell_count());
            return linear::BLACK;
        }
        match self {
            ProbeStore::SphericalHarmonics(p) => p.eval(slot, sub_probe, direction),
            ProbeStore::Cubemap(p) => p.lookup(slot, direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{sub_probe_index, ProbeEncoding};
    use crate::math::bounds::Bounds;

    #[test]
    fn sub_probes_are_octants() {
        let cell = Bounds::cube(Vec3::new(1.0, 2.0, 3.0), 0.5);
        for i in 0..8 {
            let p = cell.octant(i).center();
            assert_eq!(sub_probe_index(cell.center(), p), i);
            assert_eq!(cell.octant_index(p), i);
        }
    }

    #[test]
    fn encoding_names() {
        assert_eq!(ProbeEncoding::default().to_string(), "spherical harmonics");
        assert_eq!(ProbeEncoding::Cubemap.to_string(), "cubemap");
    }
}
