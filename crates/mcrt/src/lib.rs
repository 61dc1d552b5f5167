//! Offline global illumination baked into UV-space lightmaps.
//!
//! Direct light is sampled per texel, then indirect light is propagated with a
//! radiance cache: the scene is cut into a [grid::RadianceGrid], every occupied
//! cell owns a probe ([probe]) and each indirect bounce is a gather pass
//! (surfaces -> probes) followed by a scatter pass (probes and nearby surfaces
//! -> texels). See [pipeline::LightTransportPipeline].

pub mod aggregate;
pub mod camera;
pub mod color;
pub mod grid;
pub mod loader;
pub mod math;
pub mod octree;
pub mod pipeline;
pub mod probe;
pub mod ray;
pub mod scene;
pub mod shape;
pub mod texture;
pub mod utils;
pub mod uv_world;

pub use rand_xoshiro::Xoshiro256StarStar as Rng;

/// Identifies the random sequence of one launch thread.
///
/// Two threads never share a sequence, and the same thread gets the same
/// sequence on every run given the same global seed.
#[derive(Debug, Copy, Clone, Hash)]
#[repr(C)]
pub struct Seed {
    pub seed: u64,
    pub launch_index: u32,
    pub cell: u32,
}

impl Seed {
    pub fn into_rng(self, local_seed: u32) -> Rng {
        let mut hasher = std::hash::DefaultHasher::new();
        std::hash::Hash::hash(&self, &mut hasher);
        std::hash::Hash::hash(&local_seed, &mut hasher);
        <Rng as rand::SeedableRng>::seed_from_u64(std::hash::Hasher::finish(&hasher))
    }
}

#[cfg(test)]
mod tests {
    use rand::RngCore;

    use super::Seed;

    #[test]
    fn seeded_rng_is_reproducible() {
        let seed = Seed {
            seed: 7,
            launch_index: 12,
            cell: 3,
        };
        let a = seed.into_rng(1).next_u64();
        let b = seed.into_rng(1).next_u64();
        let c = Seed { cell: 4, ..seed }.into_rng(1).next_u64();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
