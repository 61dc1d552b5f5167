use crate::{
    math::bounds::Bounds,
    ray::Ray,
    shape::{FullIntersectionResult, IntersectionResult, Shape},
};

/// A flat list of shapes, tested one after the other.
///
/// Good enough for a handful of shapes, and the input of [super::Bvh::from_shapelist].
#[derive(Default)]
pub struct ShapeList(pub Vec<Box<dyn Shape>>);

impl ShapeList {
    pub fn push<S: Shape + 'static>(&mut self, shape: S) {
        self.0.push(Box::new(shape))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Shape for ShapeList {
    fn intersection_full(&self, mut ray: Ray) -> FullIntersectionResult {
        let mut res = IntersectionResult::NoIntersection;

        for shape in self.0.iter() {
            if let IntersectionResult::Intersection(record) = shape.intersection_full(ray) {
                ray = ray.clipped(record.t);
                res = IntersectionResult::Intersection(record);
            }
        }
        res
    }

    fn bounding_box(&self) -> Bounds {
        self.0
            .iter()
            .fold(Bounds::EMPTY, |b, shape| b.union(&shape.bounding_box()))
    }
}
