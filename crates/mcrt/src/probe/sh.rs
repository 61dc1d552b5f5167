//! Order 2 real spherical harmonics: 9 coefficients per sub-probe, one bank per color channel.
//!
//! Coefficient `basis` of sub-probe `sub` of the cell in `slot` lives at
//! `slot * 8 * 9 + sub * 9 + basis` in every bank.
use std::{
    f32::consts::PI,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::atomic::{AtomicU32, Ordering},
};

use anyhow::{Context, Result};
use glam::Vec3;
use log::debug;

use super::SUB_PROBES;
use crate::{color::Rgb, utils::atomic::AtomicF32};

pub const SH_COEFFICIENTS: usize = 9;

/// The 9 real SH basis functions at the unit direction `d`
pub fn sh_basis(d: Vec3) -> [f32; SH_COEFFICIENTS] {
    let Vec3 { x, y, z } = d;
    [
        0.282095,
        0.488603 * y,
        0.488603 * z,
        0.488603 * x,
        1.092548 * x * y,
        1.092548 * y * z,
        0.315392 * (3.0 * z * z - 1.0),
        1.092548 * x * z,
        0.546274 * (x * x - y * y),
    ]
}

pub fn sh_index(slot: u32, sub_probe: usize, basis: usize) -> usize {
    slot as usize * SUB_PROBES * SH_COEFFICIENTS + sub_probe * SH_COEFFICIENTS + basis
}

/// Weight applied once to the accumulated sums of a sub-probe that got `samples` samples
pub fn sh_weight(samples: u32) -> f32 {
    if samples == 0 {
        0.0
    } else {
        1.0 / (samples as f32 * 4.0 * PI)
    }
}

/// Coefficient sums of a gather in progress, shared by every thread of the launch.
///
/// Only written through atomic additions. [ShAccumulator::finalize] consumes it, so the
/// normalization happens exactly once.
#[derive(Debug)]
pub struct ShAccumulator {
    cell_count: usize,
    banks: [Vec<AtomicF32>; 3],
    samples: Vec<AtomicU32>,
}

impl ShAccumulator {
    pub fn new(cell_count: usize) -> Self {
        let len = cell_count * SUB_PROBES * SH_COEFFICIENTS;
        Self {
            cell_count,
            banks: std::array::from_fn(|_| (0..len).map(|_| AtomicF32::new(0.0)).collect()),
            samples: (0..cell_count * SUB_PROBES)
                .map(|_| AtomicU32::new(0))
                .collect(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Projects `radiance` arriving from `direction` and adds it to the sub-probe sums
    pub fn add_sample(&self, slot: u32, sub_probe: usize, direction: Vec3, radiance: Rgb) {
        if !radiance.is_black() {
            let rgb = radiance.to_array();
            for (basis, y) in sh_basis(direction).into_iter().enumerate() {
                let index = sh_index(slot, sub_probe, basis);
                for (bank, c) in self.banks.iter().zip(rgb) {
                    bank[index].fetch_add(c * y);
                }
            }
        }
        self.count_sample(slot, sub_probe);
    }

    /// Counts a sample that brought no radiance
    pub fn count_sample(&self, slot: u32, sub_probe: usize) {
        self.samples[slot as usize * SUB_PROBES + sub_probe].fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample_count(&self, slot: u32, sub_probe: usize) -> u32 {
        self.samples[slot as usize * SUB_PROBES + sub_probe].load(Ordering::Acquire)
    }

    /// Current sum of a coefficient
    pub fn sum(&self, slot: u32, sub_probe: usize, basis: usize) -> Rgb {
        let index = sh_index(slot, sub_probe, basis);
        Rgb::from_array(std::array::from_fn(|c| self.banks[c][index].load()))
    }

    /// Applies the weight `1 / (N * 4 pi)` to every sub-probe. Sub-probes without samples stay zero.
    pub fn finalize(self) -> ShProbes {
        let samples: Vec<u32> = self.samples.into_iter().map(AtomicU32::into_inner).collect();
        let banks = self.banks.map(|bank| {
            bank.into_iter()
                .enumerate()
                .map(|(i, c)| c.into_inner() * sh_weight(samples[i / SH_COEFFICIENTS]))
                .collect()
        });

        debug!(
            "{} SH sub-probes finalized, {} without samples",
            samples.len(),
            samples.iter().filter(|&&n| n == 0).count()
        );
        ShProbes {
            cell_count: self.cell_count,
            banks,
            samples,
        }
    }
}

/// Finalized coefficients, read only
#[derive(Debug, Clone, PartialEq)]
pub struct ShProbes {
    cell_count: usize,
    banks: [Vec<f32>; 3],
    samples: Vec<u32>,
}

impl ShProbes {
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn coefficient(&self, slot: u32, sub_probe: usize, basis: usize) -> Rgb {
        let index = sh_index(slot, sub_probe, basis);
        Rgb::from_array(std::array::from_fn(|c| self.banks[c][index]))
    }

    pub fn coefficients(&self, slot: u32, sub_probe: usize) -> [Rgb; SH_COEFFICIENTS] {
        std::array::from_fn(|basis| self.coefficient(slot, sub_probe, basis))
    }

    pub fn sample_count(&self, slot: u32, sub_probe: usize) -> u32 {
        self.samples[slot as usize * SUB_PROBES + sub_probe]
    }

    /// Reconstructed radiance from `direction`. Negative lobes are clamped to zero.
    pub fn eval(&self, slot: u32, sub_probe: usize, direction: Vec3) -> Rgb {
        let basis = sh_basis(direction);
        let base = sh_index(slot, sub_probe, 0);
        Rgb::from_array(std::array::from_fn(|c| {
            let coefficients = &self.banks[c][base..base + SH_COEFFICIENTS];
            coefficients
                .iter()
                .zip(basis)
                .map(|(k, y)| k * y)
                .sum::<f32>()
                .max(0.0)
        }))
    }

    /// One line per sub-probe, cell after cell, with the luminance of its 9 coefficients
    pub fn write_weights<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut w = BufWriter::new(file);

        for slot in 0..self.cell_count as u32 {
            for sub_probe in 0..SUB_PROBES {
                let line = self
                    .coefficients(slot, sub_probe)
                    .map(|c| c.luminance().to_string())
                    .join(" ");
                writeln!(w, "{line}")?;
            }
        }
        w.flush()
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
