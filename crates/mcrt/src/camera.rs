//! Pinhole preview of a baked scene.
use glam::{Quat, Vec2, Vec3};
use image::{ImageBuffer, Rgba};
use rayon::prelude::*;

use crate::{
    math::bounds::Bounds,
    ray::Ray,
    shape::{IntersectionResult, Shape},
    texture::{RadianceTexture, Rgba32FImage},
    utils::{counter::counter, progress::Progress},
};

pub struct Camera {
    /// width of the image, in pixel
    pub width: u32,
    /// height of the image, in pixel
    pub height: u32,

    /// Vertical field of view, in radians
    pub vfov: f32,

    pub position: Vec3,

    /// Orientation of the camera. With the identity it looks toward +Z, +Y up
    pub rotation: Quat,
}

impl Camera {
    pub fn new(width: u32, height: u32, vfov: f32, position: Vec3, rotation: Quat) -> Self {
        Self {
            width,
            height,
            vfov,
            position,
            rotation,
        }
    }

    /// A camera on the -Z side of `bounds`, looking toward +Z, whose view is filled by the
    /// front face of the box.
    pub fn framing(bounds: &Bounds, width: u32, height: u32, vfov: f32) -> Self {
        let half = bounds.diag() * 0.5;
        let aspect_ratio = width as f32 / height.max(1) as f32;
        let fit = half.y.max(half.x / aspect_ratio);
        let distance = fit / f32::tan(vfov / 2.0) + half.z;
        Self::new(
            width,
            height,
            vfov,
            bounds.center() - distance * Vec3::Z,
            Quat::IDENTITY,
        )
    }

    fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Ray through the viewport point `v` in [-1, 1]^2, (-1, -1) being the top left corner
    pub fn ray(&self, v: Vec2) -> Ray {
        let h = f32::tan(self.vfov / 2.0);
        // Looking toward +Z with +Y up, the right of the image is -X
        let local = Vec3::new(-v.x * h * self.aspect_ratio(), -v.y * h, 1.0);
        Ray::new(self.position, self.rotation.mul_vec3(local))
    }

    /// Viewport coordinates of the center of a pixel
    pub fn pixel_center(&self, x: u32, y: u32) -> Vec2 {
        let size = Vec2::new(self.width as f32, self.height as f32);
        2.0 * (Vec2::new(x as f32, y as f32) + 0.5) / size - 1.0
    }
}

/// Renders the scene through `camera`, every hit shows the lightmap at its UV.
///
/// Pixels seeing nothing are transparent.
pub fn render_preview(
    camera: &Camera,
    tracer: &dyn Shape,
    lightmap: &RadianceTexture,
    progress: Option<&Progress>,
) -> Rgba32FImage {
    let pixels: Vec<[f32; 4]> = (0..camera.width * camera.height)
        .into_par_iter()
        .map(|i| {
            let (x, y) = (i % camera.width, i / camera.width);
            counter!("Preview rays");
            let pixel = match tracer.intersection_full(camera.ray(camera.pixel_center(x, y))) {
                IntersectionResult::Intersection(hit) => {
                    let [r, g, b] = lightmap.sample(hit.local_info.uv).to_array();
                    [r, g, b, 1.0]
                }
                IntersectionResult::NoIntersection => [0.0; 4],
            };
            if let Some(progress) = progress {
                progress.add(1);
            }
            pixel
        })
        .collect();

    ImageBuffer::from_fn(camera.width, camera.height, |x, y| {
        Rgba(pixels[(y * camera.width + x) as usize])
    })
}
