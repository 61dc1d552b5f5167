use log::debug;

use crate::{
    math::bounds::Bounds,
    ray::Ray,
    shape::{FullIntersectionResult, IntersectionResult, Shape},
    utils::counter::counter,
};

use super::shapelist::ShapeList;

/// Shapes per leaf before a node gets split
const LEAF_SIZE: usize = 4;

/// A bounding volume hierarchy, built top down by median split on the main axis.
pub struct Bvh {
    bounding_box: Bounds,
    node: BvhNode,
}

pub enum BvhNode {
    Node(Box<Bvh>, Box<Bvh>),
    Leaf(ShapeList),
    Empty,
}

impl Bvh {
    pub fn from_shapelist(s: ShapeList) -> Self {
        let n = s.len();
        let bvh = Self::build(s.0);
        debug!("built a BVH over {n} shapes, bounds {:?}", bvh.bounding_box);
        bvh
    }

    fn build(mut shapes: Vec<Box<dyn Shape>>) -> Self {
        let bounding_box = shapes
            .iter()
            .fold(Bounds::EMPTY, |b, shape| b.union(&shape.bounding_box()));

        if shapes.is_empty() {
            return Self {
                bounding_box,
                node: BvhNode::Empty,
            };
        }
        if shapes.len() <= LEAF_SIZE {
            return Self {
                bounding_box,
                node: BvhNode::Leaf(ShapeList(shapes)),
            };
        }

        // Split by main axis of the centroids
        let centroids = shapes
            .iter()
            .fold(Bounds::EMPTY, |b, shape| b.union_point(shape.bounding_box().center()));
        let diag = centroids.diag();
        let axis = if diag.x >= diag.y && diag.x >= diag.z {
            0
        } else if diag.y >= diag.z {
            1
        } else {
            2
        };

        let half = shapes.len() / 2;
        shapes.select_nth_unstable_by(half, |a, b| {
            let a = a.bounding_box().center()[axis];
            let b = b.bounding_box().center()[axis];
            a.total_cmp(&b)
        });

        // Take half of it in a node, the other half in the other node
        let second_batch = shapes.split_off(half);
        let first_batch = shapes;

        Self {
            bounding_box,
            node: BvhNode::Node(
                Box::new(Self::build(first_batch)),
                Box::new(Self::build(second_batch)),
            ),
        }
    }
}

impl Shape for Bvh {
    fn intersection_full(&self, ray: Ray) -> FullIntersectionResult {
        if self.bounding_box.ray_intersect(&ray).is_none() {
            return IntersectionResult::NoIntersection;
        }
        counter!("BVH nodes visited");

        match &self.node {
            BvhNode::Node(a, b) => {
                let isect = a.intersection_full(ray);
                let ray = match isect.t() {
                    Some(t) => ray.clipped(t),
                    None => ray,
                };
                // `b` only answers hits strictly closer than the one of `a`
                isect.min(b.intersection_full(ray))
            }
            BvhNode::Leaf(l) => l.intersection_full(ray),
            BvhNode::Empty => IntersectionResult::NoIntersection,
        }
    }

    fn bounding_box(&self) -> Bounds {
        self.bounding_box
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};
    use rand::{prelude::Distribution, SeedableRng};

    use super::Bvh;
    use crate::{
        aggregate::ShapeList,
        math::distributions::UniformUnitSphere3,
        ray::Ray,
        shape::{PrimitiveId, Shape, Triangle},
    };

    fn random_triangles(n: u32) -> impl Fn() -> ShapeList {
        move || {
            let mut rng = crate::Rng::seed_from_u64(42);
            let mut list = ShapeList::default();
            for i in 0..n {
                let c = 2.0 * UniformUnitSphere3.sample(&mut rng);
                let a = 0.2 * UniformUnitSphere3.sample(&mut rng);
                let b = 0.2 * UniformUnitSphere3.sample(&mut rng);
                list.push(Triangle {
                    vertices: [c, c + a, c + b],
                    normals: [Vec3::ZERO; 3],
                    uvs: [Vec2::ZERO; 3],
                    id: PrimitiveId {
                        mesh: 0,
                        triangle: i,
                    },
                });
            }
            list
        }
    }

    #[test]
    fn bvh_agrees_with_brute_force() {
        let make = random_triangles(300);
        let list = make();
        let bvh = Bvh::from_shapelist(make());

        let mut rng = crate::Rng::seed_from_u64(7);
        let mut hits = 0;
        for _ in 0..500 {
            let ray = Ray::new(Vec3::ZERO, UniformUnitSphere3.sample(&mut rng));
            let expected = list.intersection_full(ray);
            let got = bvh.intersection_full(ray);
            assert_eq!(expected.t(), got.t());
            hits += expected.is_intersection() as u32;
        }
        assert!(hits > 0);
    }

    #[test]
    fn empty_bvh_never_hits() {
        let bvh = Bvh::from_shapelist(ShapeList::default());
        assert!(!bvh
            .intersection_full(Ray::new(Vec3::ZERO, Vec3::X))
            .is_intersection());
    }
}
