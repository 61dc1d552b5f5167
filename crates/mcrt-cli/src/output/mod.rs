mod file_output;

use anyhow::Result;
pub use file_output::FileOutput;
use mcrt::{octree::GpuOctree, pipeline::Bake, texture::Rgba32FImage};

/// Everything a run produces
pub struct BakeOutputs {
    pub bake: Bake,
    pub preview: Option<Rgba32FImage>,
    pub octree: Option<GpuOctree>,
}

pub trait FinalOutput: Send {
    fn commit(&self, outputs: &BakeOutputs) -> Result<()>;
}
