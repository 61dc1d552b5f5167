pub mod bvh;
pub mod shapelist;

pub use bvh::Bvh;
pub use shapelist::ShapeList;
