use std::sync::atomic::{AtomicU32, Ordering};

/// An `f32` that can be accumulated from many threads.
///
/// Stored as its bit pattern in an [AtomicU32], additions are a compare and swap loop.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Release)
    }

    /// Atomically adds `v`, returns the previous value
    pub fn fetch_add(&self, v: f32) -> f32 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let new = (f32::from_bits(current) + v).to_bits();
            match self
                .0
                .compare_exchange_weak(current, new, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(previous) => return f32::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.0.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::AtomicF32;

    #[test]
    fn concurrent_adds() {
        let acc = AtomicF32::new(0.0);
        (0..10_000).into_par_iter().for_each(|_| {
            acc.fetch_add(0.5);
        });
        // Every partial sum is a multiple of 0.5 below 2^24, all exact
        assert_eq!(acc.into_inner(), 5000.0);
    }
}
