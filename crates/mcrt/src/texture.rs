//! UV space images: the radiance textures the passes write, and the diffuse textures they read.
use std::path::Path;

use glam::{UVec2, Vec2};
use image::{ImageBuffer, Rgba};

use crate::{
    color::{linear, sRgb, Rgb},
    utils::log_once::warn_once,
};

/// Texture coordinates, in [0, 1]^2. (0, 0) is texel (0, 0)
pub type Uv = Vec2;

pub type Rgba32FImage = ImageBuffer<Rgba<f32>, Vec<f32>>;
pub type Rgba8Image = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// A square RGBA image indexed by lightmap texel.
///
/// One of them is produced per light bounce. Alpha is 1 on texels a pass wrote, 0 elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct RadianceTexture {
    size: u32,
    data: Vec<[f32; 4]>,
}

impl RadianceTexture {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            data: vec![[0.0; 4]; size as usize * size as usize],
        }
    }

    /// Builds a texture from one value per texel, in row major order
    pub fn from_texels(size: u32, texels: Vec<Option<Rgb>>) -> Self {
        assert_eq!(texels.len(), size as usize * size as usize);
        Self {
            size,
            data: texels
                .into_iter()
                .map(|t| match t {
                    Some(color) => {
                        let [r, g, b] = color.to_array();
                        [r, g, b, 1.0]
                    }
                    None => [0.0; 4],
                })
                .collect(),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn texel_count(&self) -> usize {
        self.data.len()
    }

    pub fn index(&self, texel: UVec2) -> usize {
        texel.y as usize * self.size as usize + texel.x as usize
    }

    pub fn texel(&self, index: usize) -> UVec2 {
        UVec2::new(index as u32 % self.size, index as u32 / self.size)
    }

    pub fn get(&self, texel: UVec2) -> Rgb {
        let [r, g, b, _] = self.data[self.index(texel)];
        Rgb::from_array([r, g, b])
    }

    pub fn set(&mut self, texel: UVec2, color: Rgb) {
        let index = self.index(texel);
        let [r, g, b] = color.to_array();
        self.data[index] = [r, g, b, 1.0];
    }

    /// Nearest texel lookup. Coordinates outside [0, 1] are clamped.
    pub fn sample(&self, uv: Uv) -> Rgb {
        match texel_of_uv(uv, self.size) {
            Some(texel) => self.get(texel),
            None => linear::BLACK,
        }
    }

    pub fn raw(&self) -> &[[f32; 4]] {
        &self.data
    }

    /// Sum of the textures, texel by texel. All textures must have the same size
    pub fn sum<'a, I: IntoIterator<Item = &'a RadianceTexture>>(size: u32, textures: I) -> Self {
        let mut res = Self::new(size);
        for texture in textures {
            assert_eq!(texture.size, size);
            for (acc, t) in res.data.iter_mut().zip(&texture.data) {
                acc[0] += t[0];
                acc[1] += t[1];
                acc[2] += t[2];
                acc[3] = acc[3].max(t[3]);
            }
        }
        res
    }

    pub fn to_hdr_image(&self) -> Rgba32FImage {
        ImageBuffer::from_fn(self.size, self.size, |x, y| {
            Rgba(self.data[self.index(UVec2::new(x, y))])
        })
    }

    /// sRGB encoded, clamped, 8 bits image
    pub fn to_ldr_image(&self) -> Rgba8Image {
        ImageBuffer::from_fn(self.size, self.size, |x, y| {
            let [r, g, b, a] = self.data[self.index(UVec2::new(x, y))];
            let [r, g, b] = Rgb::from_array([r, g, b]).to_srgb().to_byte_array();
            Rgba([r, g, b, (a.clamp(0.0, 1.0) * 255.0) as u8])
        })
    }
}

/// Texel containing `uv` on a `size` x `size` grid, `None` for an empty grid or a NaN coordinate
pub fn texel_of_uv(uv: Uv, size: u32) -> Option<UVec2> {
    if size == 0 || uv.is_nan() {
        return None;
    }
    let max = (size - 1) as f32;
    let p = (uv * size as f32).floor().clamp(Vec2::ZERO, Vec2::splat(max));
    Some(p.as_uvec2())
}

/// UV of the center of a texel
pub fn texel_center(texel: UVec2, size: u32) -> Uv {
    (texel.as_vec2() + 0.5) / size as f32
}

/// Diffuse color lookups
pub trait Texture: Send + Sync {
    fn color(&self, uv: Uv) -> Rgb;
}

pub struct Uniform(pub Rgb);

impl Texture for Uniform {
    fn color(&self, _uv: Uv) -> Rgb {
        self.0
    }
}

/// An 8 bits sRGB texture decoded to linear RGB, repeated outside [0, 1]
pub struct ImageTexture {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Rgb>,
}

impl ImageTexture {
    /// The empty texture, used in place of a texture that could not be read
    pub const EMPTY: ImageTexture = ImageTexture {
        width: 0,
        height: 0,
        pixels: Vec::new(),
    };

    pub fn from_image(image: &image::RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image
                .pixels()
                .map(|p| {
                    let [r, g, b, _] = p.0;
                    sRgb::from_array([r, g, b].map(|c| c as f32 / 255.0)).to_linear()
                })
                .collect(),
        }
    }

    /// Loads a texture. On error it is logged and the empty texture is returned: the bake
    /// continues with a black input instead of failing.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match image::open(path) {
            Ok(image) => {
                log::debug!("loaded texture {}", path.display());
                Self::from_image(&image.to_rgba8())
            }
            Err(err) => {
                log::error!("could not load texture {}: {err}", path.display());
                Self::EMPTY
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

impl Texture for ImageTexture {
    fn color(&self, uv: Uv) -> Rgb {
        if self.is_empty() {
            warn_once!("sampling an empty texture, it is black");
            return linear::BLACK;
        }
        let uv = uv - uv.floor();
        let x = ((uv.x * self.width as f32) as u32).min(self.width - 1);
        let y = ((uv.y * self.height as f32) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }
}
