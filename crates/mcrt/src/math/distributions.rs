use core::f32;
use std::ops::Deref;

use glam::Vec3;
use rand::{distributions::Uniform, prelude::Distribution, Rng};

/// Samples are expected to be in [0;1[^N
#[derive(Debug, Clone, Copy)]
pub struct Samples<const N: usize>(pub [f32; N]);
pub type Sample2D = Samples<2>;

impl<const N: usize> Deref for Samples<N> {
    type Target = [f32; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> Samples<N> {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let uniform = Uniform::new(0., 1.);
        Self(std::array::from_fn(|_| uniform.sample(rng)))
    }
}

impl Sample2D {
    /// A jittered sample in the stratum `(sx, sy)` of a `nx` x `ny` grid
    pub fn stratified<R: Rng + ?Sized>(sx: u32, sy: u32, nx: u32, ny: u32, rng: &mut R) -> Self {
        let [jx, jy] = Self::random(rng).0;
        Samples([
            (sx as f32 + jx) / nx as f32,
            (sy as f32 + jy) / ny as f32,
        ])
    }

    /// The `index`-th stratum of the squarest `nx` x `ny` grid with exactly `count` strata, jittered.
    ///
    /// A prime `count` degenerates to a `1` x `count` grid.
    pub fn stratified_index<R: Rng + ?Sized>(index: u32, count: u32, rng: &mut R) -> Self {
        let (nx, ny) = strata_grid(count);
        let index = index % (nx * ny);
        Self::stratified(index % nx, index / nx, nx, ny, rng)
    }
}

/// Largest divisor of `count` not above its square root, and the matching cofactor
fn strata_grid(count: u32) -> (u32, u32) {
    let count = count.max(1);
    let root = f32::sqrt(count as f32) as u32;
    let nx = (1..=root.max(1))
        .rev()
        .find(|d| count % d == 0)
        .unwrap_or(1);
    (nx, count / nx)
}

pub trait Samplable<T, const N: usize> {
    fn sample_with(&self, samples: Samples<N>) -> T;
}

pub struct UniformUnitBall2;
impl Samplable<[f32; 2], 2> for UniformUnitBall2 {
    fn sample_with(&self, samples: Samples<2>) -> [f32; 2] {
        let phi = f32::consts::TAU * samples[0];
        let r = samples[1].sqrt();
        let (s, c) = f32::sin_cos(phi);
        [r * c, r * s]
    }
}

/// Uniform directions on the whole sphere
pub struct UniformUnitSphere3;
impl Samplable<Vec3, 2> for UniformUnitSphere3 {
    fn sample_with(&self, samples: Samples<2>) -> Vec3 {
        let z = 1.0 - 2.0 * samples[0];
        let r = f32::sqrt(f32::max(0.0, 1.0 - z * z));
        let (s, c) = f32::sin_cos(f32::consts::TAU * samples[1]);

        Vec3::new(r * c, r * s, z)
    }
}

impl Distribution<Vec3> for UniformUnitSphere3 {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.sample_with(Samples::random(rng))
    }
}

/// Uniform directions on the +z hemisphere
pub struct UniformHemisphere3;

impl Samplable<Vec3, 2> for UniformHemisphere3 {
    fn sample_with(&self, samples: Samples<2>) -> Vec3 {
        let z = samples[0];
        let r = f32::sqrt(f32::max(0.0, 1.0 - z * z));
        let (s, c) = f32::sin_cos(f32::consts::TAU * samples[1]);

        Vec3::new(r * c, r * s, z)
    }
}

/// Cosine weighted directions on the +z hemisphere (Malley's method)
pub struct CosineHemisphere3;
impl Samplable<Vec3, 2> for CosineHemisphere3 {
    fn sample_with(&self, samples: Samples<2>) -> Vec3 {
        let [x, y] = UniformUnitBall2.sample_with(samples);
        let z = f32::sqrt(f32::max(0.0, 1.0 - x * x - y * y));

        Vec3::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn directions_are_normalized() {
        let mut rng = crate::Rng::seed_from_u64(0);
        for _ in 0..256 {
            let s = Samples::random(&mut rng);
            for d in [
                UniformUnitSphere3.sample_with(s),
                UniformHemisphere3.sample_with(s),
                CosineHemisphere3.sample_with(s),
            ] {
                assert!((d.length() - 1.0).abs() < 1e-4, "{d:?}");
            }
            assert!(UniformHemisphere3.sample_with(s).z >= 0.0);
            assert!(CosineHemisphere3.sample_with(s).z >= 0.0);
        }
    }

    #[test]
    fn strata_stay_in_their_cell() {
        let mut rng = crate::Rng::seed_from_u64(1);
        for index in 0..16 {
            let Samples([x, y]) = Sample2D::stratified_index(index, 16, &mut rng);
            assert_eq!((x * 4.0) as u32, index % 4);
            assert_eq!((y * 4.0) as u32, index / 4);
        }
    }

    #[test]
    fn non_square_counts_cover_the_square() {
        let mut rng = crate::Rng::seed_from_u64(3);
        assert_eq!(strata_grid(10), (2, 5));
        assert_eq!(strata_grid(17), (1, 17));
        assert_eq!(strata_grid(2), (1, 2));

        for count in [2, 10, 17] {
            let (nx, ny) = strata_grid(count);
            let mut hit = vec![false; count as usize];
            for index in 0..count {
                let Samples([x, y]) = Sample2D::stratified_index(index, count, &mut rng);
                let cell = (y * ny as f32) as u32 * nx + (x * nx as f32) as u32;
                hit[cell as usize] = true;
            }
            assert!(hit.iter().all(|&h| h), "{count}");
        }

        // Cosine weighted mean of cos is 2/3 whatever the sample count
        for count in [10, 17] {
            let rounds = 2000;
            let mut sum = 0.0;
            for _ in 0..rounds {
                for index in 0..count {
                    let s = Sample2D::stratified_index(index, count, &mut rng);
                    sum += CosineHemisphere3.sample_with(s).z;
                }
            }
            let mean = sum / (rounds * count) as f32;
            assert!((mean - 2.0 / 3.0).abs() < 0.01, "{count}: {mean}");
        }
    }

    #[test]
    fn sphere_mean_is_centered() {
        let mut rng = crate::Rng::seed_from_u64(2);
        let n = 20_000;
        let mean = (0..n).map(|_| UniformUnitSphere3.sample(&mut rng)).sum::<Vec3>() / n as f32;
        assert!(mean.length() < 0.03, "{mean:?}");
    }
}
