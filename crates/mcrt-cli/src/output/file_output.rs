use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba};
use mcrt::{
    color::Rgb,
    probe::ProbeStore,
    texture::{RadianceTexture, Rgba32FImage, Rgba8Image},
};

use super::{BakeOutputs, FinalOutput};

pub struct FileOutput {
    pub hdr_outdir: Option<PathBuf>,
    pub ldr_outdir: Option<PathBuf>,
    pub data_outdir: Option<PathBuf>,
    /// Also dump the octree as text, next to the binary file
    pub octree_txt: bool,
}

impl FileOutput {
    pub fn new(outdir: PathBuf, octree_txt: bool) -> Self {
        Self {
            hdr_outdir: Some(outdir.join("hdr")),
            ldr_outdir: Some(outdir.join("ldr")),
            data_outdir: Some(outdir.join("data")),
            octree_txt,
        }
    }
}

fn textures(outputs: &BakeOutputs) -> Vec<(String, RadianceTexture)> {
    let mut textures: Vec<_> = outputs
        .bake
        .bounces
        .iter()
        .enumerate()
        .map(|(i, t)| (format!("bounce_{i}"), t.clone()))
        .collect();
    if let Some(composite) = outputs.bake.composite() {
        textures.push(("lightmap".to_owned(), composite));
    }
    textures
}

fn preview_to_ldr(preview: &Rgba32FImage) -> Rgba8Image {
    ImageBuffer::from_fn(preview.width(), preview.height(), |x, y| {
        let [r, g, b, a] = preview.get_pixel(x, y).0;
        let [r, g, b] = Rgb::from_array([r, g, b]).to_srgb().to_byte_array();
        Rgba([r, g, b, (a.clamp(0.0, 1.0) * 255.0) as u8])
    })
}

impl FinalOutput for FileOutput {
    fn commit(&self, outputs: &BakeOutputs) -> Result<()> {
        let textures = textures(outputs);

        if let Some(ref hdr_output) = self.hdr_outdir {
            let hdr_path = hdr_output.as_path();
            std::fs::create_dir_all(hdr_output)?;

            log::info!("Saving HDR images...");
            for (name, texture) in &textures {
                let path = hdr_path.join(format!("{name}.exr"));
                texture
                    .to_hdr_image()
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(ref preview) = outputs.preview {
                preview.save(hdr_path.join("preview.exr"))?;
            }
        }

        if let Some(ref ldr_output) = self.ldr_outdir {
            let ldr_path = ldr_output.as_path();
            std::fs::create_dir_all(ldr_output)?;

            log::info!("Saving LDR images...");
            for (name, texture) in &textures {
                let path = ldr_path.join(format!("{name}.png"));
                texture
                    .to_ldr_image()
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(ref preview) = outputs.preview {
                preview_to_ldr(preview).save(ldr_path.join("preview.png"))?;
            }
        }

        if let Some(ref data_output) = self.data_outdir {
            std::fs::create_dir_all(data_output)?;

            if let Some(ref octree) = outputs.octree {
                log::info!("Saving octree...");
                octree.save_octree_to_file(data_output.join("octree.bin"))?;
                if self.octree_txt {
                    octree.write_gpu_octree_to_txt_file(data_output.join("octree.txt"))?;
                }
            }
            for (i, probes) in outputs.bake.probes.iter().enumerate() {
                if let ProbeStore::SphericalHarmonics(sh) = probes {
                    sh.write_weights(data_output.join(format!("weights_bounce_{}.txt", i + 1)))?;
                }
            }
        }
        Ok(())
    }
}
