use glam::Vec3;

use crate::ray::Ray;

/// Axis Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    /// Should have all coordinates >= min
    pub max: Vec3,
}

impl Bounds {
    /// The empty box: union with anything gives the other box back
    pub const EMPTY: Bounds = Bounds {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |bounds, &p| bounds.union_point(p))
    }

    pub fn cube(min: Vec3, side: f32) -> Self {
        Self {
            min,
            max: min + Vec3::splat(side),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn union_point(&self, p: Vec3) -> Bounds {
        Bounds {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn diag(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// True if both boxes share a volume. Touching faces do not count.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.cmplt(other.max).all() && other.min.cmplt(self.max).all()
    }

    /// True if both boxes share at least a point, faces included
    pub fn touches(&self, other: &Bounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// The smallest cube sharing `min` with self and containing it
    pub fn enclosing_cube(&self) -> Bounds {
        Bounds::cube(self.min, self.diag().max_element())
    }

    /// One of the 8 octants. Bit 0 of `index` selects +x, bit 1 +y, bit 2 +z.
    pub fn octant(&self, index: usize) -> Bounds {
        let half = 0.5 * self.diag();
        let offset = Vec3::new(
            (index & 1) as f32,
            ((index >> 1) & 1) as f32,
            ((index >> 2) & 1) as f32,
        );
        let min = self.min + offset * half;
        Bounds {
            min,
            max: min + half,
        }
    }

    /// Octant of the box containing `p`, see [Bounds::octant]
    pub fn octant_index(&self, p: Vec3) -> usize {
        let c = self.center();
        (p.x >= c.x) as usize | ((p.y >= c.y) as usize) << 1 | ((p.z >= c.z) as usize) << 2
    }

    /// Returns the parametric range of `ray` inside the box, restricted to the ray bounds.
    pub fn ray_intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        // Slab method. Division by a zero component gives +/- infty which is what we want,
        // a NaN (0 * infty) only appears when the origin sits exactly on a slab
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;

        let t_min = t0.min(t1).max_element().max(ray.bounds.0);
        let t_max = t0.max(t1).min_element().min(ray.bounds.1);

        if t_min.is_nan() || t_max.is_nan() || t_min > t_max {
            None
        } else {
            Some((t_min, t_max))
        }
    }
}
