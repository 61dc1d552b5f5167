use glam::Vec3;

use crate::{
    math::{bounds::Bounds, float::FloatAsExt},
    ray::Ray,
    texture::Uv,
};

use super::{local_info, FullIntersectionResult, IntersectionResult, PrimitiveId, RayIntersection, Shape};

/// A triangle with per vertex normals and lightmap coordinates
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uvs: [Uv; 3],
    pub id: PrimitiveId,
}

impl Triangle {
    pub fn geometric_normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(c - a).normalize_or_zero()
    }

    pub fn area(&self) -> f32 {
        let [a, b, c] = self.vertices;
        0.5 * (b - a).cross(c - a).length()
    }

    /// Interpolated shading normal for barycentric coordinates (u, v) of vertices 1 and 2
    pub fn normal_at(&self, u: f32, v: f32) -> Vec3 {
        let w = 1.0 - u - v;
        let n = w * self.normals[0] + u * self.normals[1] + v * self.normals[2];
        n.try_normalize().unwrap_or_else(|| self.geometric_normal())
    }

    pub fn uv_at(&self, u: f32, v: f32) -> Uv {
        let w = 1.0 - u - v;
        w * self.uvs[0] + u * self.uvs[1] + v * self.uvs[2]
    }

    pub fn position_at(&self, u: f32, v: f32) -> Vec3 {
        let w = 1.0 - u - v;
        w * self.vertices[0] + u * self.vertices[1] + v * self.vertices[2]
    }
}

/// Barycentric slack, so rays through a shared edge do not slip between two triangles
const EDGE_EPSILON: f32 = 1e-6;

/// A private type that stores the result of the Möller-Trumbore algorithm
enum MollerTrumboreResult {
    Result { u: f32, v: f32, t: f32 },
    NoResult,
}

impl MollerTrumboreResult {
    fn moller_trumbore(vertices: &[Vec3; 3], ray: &Ray) -> Self {
        let e1 = vertices[1] - vertices[0];
        let e2 = vertices[2] - vertices[0];
        let p = ray.direction.cross(e2);

        // Ray parallel to the triangle plane, or degenerate triangle
        let Some(det) = e1.dot(p).into_non_zero(1e-12) else {
            return MollerTrumboreResult::NoResult;
        };
        let inv_det = 1.0 / det;

        let s = ray.origin - vertices[0];
        let u = s.dot(p) * inv_det;
        if !(-EDGE_EPSILON..=1.0 + EDGE_EPSILON).contains(&u) {
            return MollerTrumboreResult::NoResult;
        }

        let q = s.cross(e1);
        let v = ray.direction.dot(q) * inv_det;
        if v < -EDGE_EPSILON || u + v > 1.0 + EDGE_EPSILON {
            return MollerTrumboreResult::NoResult;
        }

        let t = e2.dot(q) * inv_det;
        MollerTrumboreResult::Result { u, v, t }
    }
}

impl Shape for Triangle {
    fn intersection_full(&self, ray: Ray) -> FullIntersectionResult {
        match MollerTrumboreResult::moller_trumbore(&self.vertices, &ray) {
            MollerTrumboreResult::Result { u, v, t } if ray.range().contains(&t) => {
                let normal = self.normal_at(u, v);
                // Surfaces are two sided: the normal faces the incoming ray
                let normal = if normal.dot(ray.direction) > 0.0 {
                    -normal
                } else {
                    normal
                };
                IntersectionResult::Intersection(RayIntersection {
                    t,
                    local_info: local_info::Full {
                        pos: ray.at(t),
                        normal,
                        uv: self.uv_at(u, v),
                        primitive: self.id,
                    },
                })
            }
            _ => IntersectionResult::NoIntersection,
        }
    }

    fn bounding_box(&self) -> Bounds {
        Bounds::from_points(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::Triangle;
    use crate::{
        ray::Ray,
        shape::{IntersectionResult, PrimitiveId, Shape},
    };

    fn triangle() -> Triangle {
        Triangle {
            vertices: [Vec3::ZERO, Vec3::X, Vec3::Z],
            normals: [Vec3::Y; 3],
            uvs: [Vec2::ZERO, Vec2::X, Vec2::Y],
            id: PrimitiveId {
                mesh: 0,
                triangle: 0,
            },
        }
    }

    #[test]
    fn hit_gives_interpolated_uv() {
        let ray = Ray::new(Vec3::new(0.25, 1.0, 0.25), Vec3::NEG_Y);
        let IntersectionResult::Intersection(record) = triangle().intersection_full(ray) else {
            panic!("expected a hit");
        };

        assert!((record.t - 1.0).abs() < 1e-5);
        assert!((record.local_info.uv - Vec2::new(0.25, 0.25)).length() < 1e-5);
        assert!((record.local_info.normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn normal_faces_the_ray() {
        let ray = Ray::new(Vec3::new(0.25, -1.0, 0.25), Vec3::Y);
        let IntersectionResult::Intersection(record) = triangle().intersection_full(ray) else {
            panic!("expected a hit");
        };
        assert!((record.local_info.normal - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn misses() {
        let t = triangle();
        // outside the triangle
        assert!(!t
            .intersection_full(Ray::new(Vec3::new(0.8, 1.0, 0.8), Vec3::NEG_Y))
            .is_intersection());
        // behind the origin
        assert!(!t
            .intersection_full(Ray::new(Vec3::new(0.25, 1.0, 0.25), Vec3::Y))
            .is_intersection());
        // out of range
        assert!(!t
            .trace(Vec3::new(0.25, 1.0, 0.25), Vec3::NEG_Y, 0.0, 0.5)
            .is_intersection());
    }
}
