use std::path::Path;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};

use crate::{
    color::Rgb,
    math::transform::Transform,
    scene::{MaterialId, Mesh, Scene},
    texture::{ImageTexture, Uniform},
};

pub trait ObjLoaderExt {
    /// Loads every model of an OBJ file as a mesh, with the diffuse part of its materials.
    ///
    /// Models without a material use `default_material`.
    fn load_obj<P: AsRef<Path>>(
        &mut self,
        mesh_path: P,
        transform: Transform,
        default_material: MaterialId,
    ) -> Result<()>;
}

impl ObjLoaderExt for Scene {
    fn load_obj<P: AsRef<Path>>(
        &mut self,
        mesh_path: P,
        transform: Transform,
        default_material: MaterialId,
    ) -> Result<()> {
        let mesh_path = mesh_path.as_ref();
        let mut options = tobj::GPU_LOAD_OPTIONS;
        options.single_index = true;
        let (models, materials) = tobj::load_obj(mesh_path, &options)
            .with_context(|| format!("failed to load OBJ file {}", mesh_path.display()))?;

        let materials = match materials {
            Ok(materials) => materials,
            Err(err) => {
                log::warn!("no material read for {}: {err}", mesh_path.display());
                Vec::new()
            }
        };
        let directory = mesh_path.parent().unwrap_or(Path::new("."));

        let material_ids: Vec<MaterialId> = materials
            .into_iter()
            .map(|material| {
                let label = Some(material.name.clone());
                let mat_id = if material.diffuse_texture.is_empty() {
                    self.insert_material(label, Uniform(Rgb::from_array(material.diffuse)))
                } else {
                    // A texture that cannot be read is replaced by the empty one
                    let texture = ImageTexture::load(directory.join(&material.diffuse_texture));
                    self.insert_material(label, texture)
                };
                log::debug!(
                    "inserting material {} with diffuse {:?} on mat_id {:?}",
                    material.name,
                    material.diffuse,
                    mat_id
                );
                mat_id
            })
            .collect();

        for model in models {
            let mesh = model.mesh;
            log::debug!("loading model {}", model.name);

            if mesh.texcoords.is_empty() {
                log::warn!("model {} has no UV, its lightmap will be empty", model.name);
            }
            let material = mesh
                .material_id
                .and_then(|id| material_ids.get(id).copied())
                .unwrap_or(default_material);

            let indices: &[[u32; 3]] = bytemuck::try_cast_slice(&mesh.indices)
                .map_err(|err| anyhow::anyhow!("model {}: bad index count: {err}", model.name))?;

            let mut mesh = Mesh {
                label: Some(model.name),
                positions: mesh
                    .positions
                    .chunks_exact(3)
                    .map(Vec3::from_slice)
                    .collect(),
                normals: mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect(),
                // OBJ texture coordinates start at the bottom left, lightmap texels at the top left
                uvs: mesh
                    .texcoords
                    .chunks_exact(2)
                    .map(|uv| Vec2::new(uv[0], 1.0 - uv[1]))
                    .collect(),
                indices: indices.to_vec(),
                material,
            };
            mesh.transform(&transform);
            self.insert_mesh(mesh);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::ObjLoaderExt;
    use crate::{
        color::Rgb,
        math::transform::Transform,
        scene::{MaterialId, Scene},
    };

    #[test]
    fn load_quad_with_materials() {
        let dir = std::env::temp_dir().join(format!("mcrt-obj-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("quad.mtl"),
            "newmtl red\nKd 1 0 0\n\nnewmtl textured\nKd 1 1 1\nmap_Kd missing.png\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("quad.obj"),
            "mtllib quad.mtl\n\
             o floor\n\
             v 0 0 0\nv 1 0 0\nv 1 0 1\nv 0 0 1\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             usemtl red\n\
             f 1/1 4/4 3/3 2/2\n\
             o wall\n\
             v 0 0 0\nv 0 1 0\nv 1 1 0\n\
             vt 0 0\nvt 0 1\nvt 1 1\n\
             usemtl textured\n\
             f 5/5 6/6 7/7\n",
        )
        .unwrap();

        let mut scene = Scene::new();
        scene
            .load_obj(dir.join("quad.obj"), Transform::IDENTITY, MaterialId(0))
            .unwrap();

        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.triangle_count(), 3);
        // Default material, red, then the textured one
        assert_eq!(scene.materials.len(), 3);

        let floor = &scene.meshes[0];
        assert_eq!(floor.positions.len(), 4);
        assert_eq!(floor.uvs[0], Vec2::new(0.0, 1.0));
        assert_eq!(
            scene.diffuse(floor.material, Vec2::splat(0.5)),
            Rgb::from_array([1.0, 0.0, 0.0])
        );

        // The texture cannot be read: the material is black instead of failing the load
        let wall = &scene.meshes[1];
        assert!(scene.diffuse(wall.material, Vec2::splat(0.5)).is_black());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut scene = Scene::new();
        let res = scene.load_obj("does/not/exist.obj", Transform::IDENTITY, MaterialId(0));
        assert!(res.is_err());
    }
}
