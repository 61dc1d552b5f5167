/// The colorspaces used by the baker.
///
/// All the light transport happens in linear RGB. sRGB is only a transfer format for 8 bits
/// inputs (diffuse textures) and outputs (LDR lightmaps).
pub trait Colorspace: Copy + Clone + Send + Sync + bytemuck::Zeroable + bytemuck::Pod {}

/// Linear sRGB: the way to go for math manipulations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
#[allow(non_camel_case_types)]
pub struct Linear_RGB;
impl Linear_RGB {
    pub fn from_srgb(srgb: f32) -> f32 {
        let srgb = srgb.clamp(0.0, 1.0);
        if srgb.is_nan() {
            0.0
        } else if srgb <= 0.04045 {
            srgb / 12.92
        } else {
            ((srgb + 0.055) / 1.055).powf(2.4)
        }
    }
}
impl Colorspace for Linear_RGB {}

/// sRGB: gamma encoded, YOU CAN'T DO MATH ON sRGB.
///
/// Low brightness values get more codes, which matters when storing colors on 8 bits.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
#[allow(non_camel_case_types)]
pub struct sRGB;
impl sRGB {
    pub fn from_linear_rgb(linear: f32) -> f32 {
        let linear = linear.clamp(0.0, 1.0);
        if linear.is_nan() {
            0.0
        } else if linear < 0.0031308 {
            12.92 * linear
        } else {
            1.055 * linear.powf(1.0 / 2.4) - 0.055
        }
    }
}
impl Colorspace for sRGB {}
