//! The ray intersection oracle.
//!
//! Everything the light transport needs from the geometry is
//! `trace(origin, direction, t_min, t_max) -> hit | miss`, expressed by the [Shape] trait.
//! Meshes are made of [Triangle]s and are accelerated by [crate::aggregate::bvh::Bvh].

pub mod triangle;

pub use triangle::Triangle;

use glam::Vec3;

use crate::{math::bounds::Bounds, ray::Ray, texture::Uv};

/// Something rays can be traced against.
pub trait Shape: Sync + Send {
    /// Check whether `ray` intersect the shape defined by `self` if so, gives all the information needed
    fn intersection_full(&self, ray: Ray) -> FullIntersectionResult;

    /// Returns the bounding box of the shape
    fn bounding_box(&self) -> Bounds;

    /// Closest hit along `direction` in the parametric range `[t_min, t_max]`
    fn trace(&self, origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> FullIntersectionResult {
        self.intersection_full(Ray::new_with_range(origin, direction, t_min..t_max))
    }
}

pub mod local_info {
    use glam::Vec3;

    use crate::texture::Uv;

    /// Contains all the local information about a surface point
    #[derive(Debug, Clone, Copy)]
    pub struct Full {
        pub pos: Vec3,
        /// Shading normal, facing the side the ray came from
        pub normal: Vec3,
        /// Lightmap coordinates at the hit point
        pub uv: Uv,
        pub primitive: super::PrimitiveId,
    }
}

/// Identifies a triangle: the mesh it belongs to and its index in that mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId {
    pub mesh: u32,
    pub triangle: u32,
}

/// Holds local informations and the time of a colision between a ray and a shape.
#[derive(Debug, Clone, Copy)]
pub struct RayIntersection<LocalInfo> {
    pub t: f32,
    pub local_info: LocalInfo,
}

/// A `Result`-like type that takes care of intersections data.
///
/// Whether something was hit is carried by the variant, never guessed from a distance.
#[derive(Debug, Clone, Copy)]
pub enum IntersectionResult<LocalInfo> {
    Intersection(RayIntersection<LocalInfo>),
    NoIntersection,
}

impl<T> IntersectionResult<T> {
    pub fn is_intersection(&self) -> bool {
        matches!(self, Self::Intersection(_))
    }

    pub fn t(&self) -> Option<f32> {
        match self {
            Self::Intersection(record) => Some(record.t),
            Self::NoIntersection => None,
        }
    }

    pub fn min(self, other: Self) -> Self {
        let Self::Intersection(RayIntersection { t: t1, .. }) = self else {
            return other;
        };
        let Self::Intersection(RayIntersection { t: t2, .. }) = other else {
            return self;
        };

        if t1 <= t2 {
            self
        } else {
            other
        }
    }
}

pub type FullIntersectionResult = IntersectionResult<local_info::Full>;

impl FullIntersectionResult {
    /// Lightmap coordinates of the hit, if any
    pub fn uv(&self) -> Option<Uv> {
        match self {
            Self::Intersection(record) => Some(record.local_info.uv),
            Self::NoIntersection => None,
        }
    }
}
