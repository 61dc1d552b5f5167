use std::ops::{Range, RangeInclusive};

use glam::Vec3;

/// Distance a ray origin is pushed along the surface normal before tracing, to avoid
/// hitting the surface it starts from.
pub const SURFACE_OFFSET: f32 = 1e-4;

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub bounds: (f32, f32),
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            bounds: (0.0, f32::INFINITY),
        }
    }

    pub fn new_with_range(origin: Vec3, direction: Vec3, range: Range<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            bounds: (range.start, range.end),
        }
    }

    /// A ray leaving a surface point: the origin is nudged by [SURFACE_OFFSET] along
    /// `normal`, on the side `direction` points to.
    pub fn from_surface(position: Vec3, normal: Vec3, direction: Vec3, t_max: f32) -> Self {
        let side = if normal.dot(direction) >= 0.0 { 1.0 } else { -1.0 };
        Self::new_with_range(
            position + side * SURFACE_OFFSET * normal,
            direction,
            0.0..t_max,
        )
    }

    pub fn range(&self) -> RangeInclusive<f32> {
        self.bounds.0..=self.bounds.1
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// The same ray, with the far bound lowered to `t` (a closer hit was found).
    pub fn clipped(self, t: f32) -> Self {
        Self {
            bounds: (self.bounds.0, t.min(self.bounds.1)),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{Ray, SURFACE_OFFSET};

    #[test]
    fn ray() {
        let eps = 0.01;
        let ray = Ray::new(Vec3::new(1., 0., 0.), Vec3::new(-1., 1., 0.));

        assert!(ray.at(0.0).distance_squared(ray.origin) < eps);
        assert!(ray.at(1.0).distance_squared(ray.origin + ray.direction) < eps);
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn surface_rays_leave_on_the_right_side() {
        let up = Ray::from_surface(Vec3::ZERO, Vec3::Y, Vec3::new(0.0, 1.0, 1.0), 1.0);
        let down = Ray::from_surface(Vec3::ZERO, Vec3::Y, Vec3::NEG_Y, 1.0);

        assert!((up.origin.y - SURFACE_OFFSET).abs() < 1e-9);
        assert!((down.origin.y + SURFACE_OFFSET).abs() < 1e-9);
        assert_eq!(up.bounds, (0.0, 1.0));
    }
}
