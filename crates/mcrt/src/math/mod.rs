pub mod bounds;
pub mod distributions;
pub mod float;
pub mod transform;
