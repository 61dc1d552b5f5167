use std::{fmt::Display, sync::atomic};

/// A shared progress counter towards a known maximum
#[derive(Debug)]
pub struct Progress {
    current: atomic::AtomicUsize,
    max: usize,
}

impl Progress {
    pub fn new(max: usize) -> Self {
        Self {
            current: Default::default(),
            max,
        }
    }

    pub fn add(&self, k: usize) -> usize {
        self.current.fetch_add(k, atomic::Ordering::SeqCst)
    }

    pub fn get_raw(&self) -> usize {
        self.current.load(atomic::Ordering::SeqCst)
    }

    /// Fraction done, in [0, 1]
    pub fn get(&self) -> f32 {
        if self.max == 0 {
            return 1.0;
        }
        (self.get_raw() as f32 / self.max as f32).clamp(0.0, 1.0)
    }

    pub fn done(&self) -> bool {
        self.get_raw() >= self.max
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        PercentBar {
            percent: self.get(),
            width: 50,
        }
        .fmt(f)
    }
}

pub struct PercentBar {
    pub percent: f32,
    pub width: usize,
}

impl Display for PercentBar {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filled = ((self.width - 1) as f32 * self.percent).round() as usize;
        write!(
            f,
            "[{empty:=>width_left$}>{empty:.<width_right$}] {percent:.1}%",
            empty = "",
            width_left = filled,
            width_right = self.width - 1 - filled,
            percent = 100. * self.percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{PercentBar, Progress};

    #[test]
    fn bar() {
        let bar = PercentBar {
            percent: 0.5,
            width: 11,
        };
        assert_eq!(bar.to_string(), "[=====>.....] 50.0%");
    }

    #[test]
    fn progress_saturates() {
        let p = Progress::new(4);
        p.add(3);
        assert!(!p.done());
        p.add(3);
        assert!(p.done());
        assert_eq!(p.get(), 1.0);
        assert_eq!(Progress::new(0).get(), 1.0);
    }
}
