//! Data parallel launches over a 3D grid of logical threads, run on the rayon pool.
use std::fmt::Display;

use rayon::prelude::*;

use crate::utils::progress::Progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchDimensions {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl LaunchDimensions {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub fn count(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Display for LaunchDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchIndex {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl LaunchIndex {
    /// Index of the thread inside its column
    pub fn local(&self, dims: LaunchDimensions) -> u32 {
        self.y + self.z * dims.y
    }
}

/// Runs `f` once per thread of the launch, in no particular order.
/// Threads can only communicate through atomics.
pub fn launch<F>(dims: LaunchDimensions, progress: Option<&Progress>, f: F)
where
    F: Fn(LaunchIndex) + Sync + Send,
{
    log::trace!("launch {dims}");
    (0..dims.x).into_par_iter().for_each(|x| {
        (0..dims.y).into_par_iter().for_each(|y| {
            for z in 0..dims.z {
                f(LaunchIndex { x, y, z });
            }
        });
        if let Some(progress) = progress {
            progress.add(1);
        }
    });
}

/// Runs the threads of a column `x` one after the other on a state built by `init(x)`, columns
/// in parallel. Returns the final states, indexed by column.
pub fn launch_columns<A, I, F>(
    dims: LaunchDimensions,
    progress: Option<&Progress>,
    init: I,
    f: F,
) -> Vec<A>
where
    A: Send,
    I: Fn(u32) -> A + Sync + Send,
    F: Fn(&mut A, LaunchIndex) + Sync + Send,
{
    log::trace!("launch by columns {dims}");
    (0..dims.x)
        .into_par_iter()
        .map(|x| {
            let mut state = init(x);
            for z in 0..dims.z {
                for y in 0..dims.y {
                    f(&mut state, LaunchIndex { x, y, z });
                }
            }
            if let Some(progress) = progress {
                progress.add(1);
            }
            state
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::{launch, launch_columns, LaunchDimensions};
    use crate::utils::progress::Progress;

    #[test]
    fn every_thread_runs_once() {
        let dims = LaunchDimensions::new(7, 3, 5);
        let sum = AtomicU64::new(0);
        let progress = Progress::new(dims.x as usize);
        launch(dims, Some(&progress), |i| {
            sum.fetch_add(1 + (i.x + 7 * (i.y + 3 * i.z)) as u64, Ordering::Relaxed);
        });
        let n = dims.count();
        assert_eq!(sum.into_inner(), n * (n + 1) / 2);
        assert!(progress.done());
    }

    #[test]
    fn columns_keep_their_order() {
        let dims = LaunchDimensions::new(100, 4, 2);
        let res = launch_columns(dims, None, |x| (x, Vec::new()), |(_, seen), i| {
            seen.push(i.local(dims))
        });
        for (x, (col, seen)) in res.into_iter().enumerate() {
            assert_eq!(col as usize, x);
            assert_eq!(seen, (0..8).collect::<Vec<_>>());
        }
        assert!(launch_columns(LaunchDimensions::new(0, 1, 1), None, |x| x, |_, _| ()).is_empty());
    }
}
