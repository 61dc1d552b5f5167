use std::marker::PhantomData;

use bytemuck::Zeroable;

pub mod colorspace;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Zeroable)]
pub struct Color<S>(pub [f32; 3], PhantomData<S>)
where
    S: colorspace::Colorspace;

unsafe impl<S: colorspace::Colorspace> bytemuck::Pod for Color<S> {}

impl<S: colorspace::Colorspace> Default for Color<S> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<S: colorspace::Colorspace> std::ops::Add for Color<S> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_array([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl<S: colorspace::Colorspace> std::ops::AddAssign for Color<S> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<S: colorspace::Colorspace> std::ops::Mul<Color<S>> for f32 {
    type Output = Color<S>;

    fn mul(self, rhs: Color<S>) -> Self::Output {
        Color::from_array([self * rhs.0[0], self * rhs.0[1], self * rhs.0[2]])
    }
}

/// Component-wise product, used to filter light by an albedo
impl<S: colorspace::Colorspace> std::ops::Mul for Color<S> {
    type Output = Color<S>;

    fn mul(self, rhs: Color<S>) -> Self::Output {
        Color::from_array([
            self.0[0] * rhs.0[0],
            self.0[1] * rhs.0[1],
            self.0[2] * rhs.0[2],
        ])
    }
}

impl<S: colorspace::Colorspace> std::ops::Div<f32> for Color<S> {
    type Output = Color<S>;

    fn div(self, rhs: f32) -> Self::Output {
        Color::from_array([self.0[0] / rhs, self.0[1] / rhs, self.0[2] / rhs])
    }
}

#[allow(non_camel_case_types)]
pub type sRgb = Color<colorspace::sRGB>;
pub type Rgb = Color<colorspace::Linear_RGB>;

impl<S: colorspace::Colorspace> Color<S> {
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self(arr, PhantomData)
    }

    pub const fn splat(v: f32) -> Self {
        Self::from_array([v, v, v])
    }

    pub const fn to_array(self) -> [f32; 3] {
        self.0
    }

    pub fn to_byte_array(self) -> [u8; 3] {
        self.0.map(|c| (c.clamp(0.0, 1.0) * 255. + 0.5) as u8)
    }

    pub fn max_element(self) -> f32 {
        self.0[0].max(self.0[1]).max(self.0[2])
    }

    pub fn is_black(self) -> bool {
        self.0 == [0.0; 3]
    }
}

impl Rgb {
    /// Relative luminance (Rec. 709 weights)
    pub fn luminance(self) -> f32 {
        let [r, g, b] = self.0;
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    pub fn to_srgb(self) -> sRgb {
        sRgb::from_array(self.0.map(colorspace::sRGB::from_linear_rgb))
    }
}

impl sRgb {
    pub fn to_linear(self) -> Rgb {
        Rgb::from_array(self.0.map(colorspace::Linear_RGB::from_srgb))
    }
}

pub mod linear {
    use super::Rgb;

    pub const WHITE: Rgb = Rgb::from_array([1.0, 1.0, 1.0]);
    pub const BLACK: Rgb = Rgb::from_array([0.0, 0.0, 0.0]);
}

#[cfg(test)]
mod tests {
    use super::{linear, Rgb};

    #[test]
    fn srgb_round_trip() {
        let c = Rgb::from_array([0.0, 0.2, 0.9]);
        let back = c.to_srgb().to_linear();
        for (a, b) in c.0.iter().zip(back.0) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn luminance_of_white_is_one() {
        assert!((linear::WHITE.luminance() - 1.0).abs() < 1e-4);
        assert_eq!(linear::BLACK.luminance(), 0.0);
    }
}
