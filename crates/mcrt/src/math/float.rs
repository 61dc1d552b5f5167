pub trait FloatAsExt: Sized {
    /// Returns `Some(f)` if `|f| > eps`, `None` otherwise (NaN included).
    ///
    /// Used to reject degenerate denominators: triangle areas, ray directions...
    fn into_non_zero(self, eps: Self) -> Option<Self>;

    /// Integer cell index of `self` on a regular lattice of step `step` starting at `origin`,
    /// clamped to `[0, len - 1]`
    fn lattice_index(self, origin: Self, step: Self, len: u32) -> u32;
}

impl FloatAsExt for f32 {
    fn into_non_zero(self, eps: Self) -> Option<f32> {
        (self.abs() > eps).then_some(self)
    }

    fn lattice_index(self, origin: Self, step: Self, len: u32) -> u32 {
        let i = ((self - origin) / step).floor();
        // `as` saturates: negative values and NaN become 0
        (i as u32).min(len.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::FloatAsExt;

    #[test]
    fn non_zero() {
        assert_eq!(0.0f32.into_non_zero(1e-6), None);
        assert_eq!((-1e-8f32).into_non_zero(1e-6), None);
        assert_eq!(0.5f32.into_non_zero(1e-6), Some(0.5));
        assert_eq!(f32::NAN.into_non_zero(1e-6), None);
        assert_eq!(f32::NEG_INFINITY.into_non_zero(1e-6), Some(f32::NEG_INFINITY));
    }

    #[test]
    fn lattice() {
        assert_eq!(0.0f32.lattice_index(0.0, 0.25, 4), 0);
        assert_eq!(0.26f32.lattice_index(0.0, 0.25, 4), 1);
        assert_eq!(0.99f32.lattice_index(0.0, 0.25, 4), 3);
        // Clamped on both sides
        assert_eq!(1.0f32.lattice_index(0.0, 0.25, 4), 3);
        assert_eq!((-0.1f32).lattice_index(0.0, 0.25, 4), 0);
        assert_eq!((-0.6f32).lattice_index(-1.0, 0.5, 4), 0);
    }
}
