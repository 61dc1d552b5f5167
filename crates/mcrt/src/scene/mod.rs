pub mod examples;

use glam::Vec3;
use log::debug;

use crate::{
    aggregate::{Bvh, ShapeList},
    color::Rgb,
    math::{bounds::Bounds, distributions::Sample2D, transform::Transform},
    shape::{PrimitiveId, Triangle},
    texture::{Texture, Uv},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialId(pub usize);

/// A Lambertian material
pub struct MaterialDescriptor {
    pub label: Option<String>,
    pub diffuse: Box<dyn Texture>,
}

impl std::fmt::Debug for MaterialDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialDescriptor")
            .field("label", &self.label)
            .field("diffuse", &"<texture>")
            .finish()
    }
}

/// An indexed triangle mesh.
///
/// `uvs` are the lightmap coordinates, they are also used to look the diffuse texture up.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub label: Option<String>,
    pub positions: Vec<Vec3>,
    /// Per vertex normals, may be empty: geometric normals are used instead
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Uv>,
    pub indices: Vec<[u32; 3]>,
    pub material: MaterialId,
}

impl Default for MaterialId {
    fn default() -> Self {
        MaterialId(0)
    }
}

impl Mesh {
    pub fn triangle(&self, mesh_id: u32, triangle: usize) -> Triangle {
        let [a, b, c] = self.indices[triangle].map(|i| i as usize);
        let vertices = [self.positions[a], self.positions[b], self.positions[c]];
        let geometric = (vertices[1] - vertices[0])
            .cross(vertices[2] - vertices[0])
            .normalize_or_zero();
        let normals = if self.normals.is_empty() {
            [geometric; 3]
        } else {
            [self.normals[a], self.normals[b], self.normals[c]]
        };
        let uvs = if self.uvs.is_empty() {
            [Uv::ZERO; 3]
        } else {
            [self.uvs[a], self.uvs[b], self.uvs[c]]
        };

        Triangle {
            vertices,
            normals,
            uvs,
            id: PrimitiveId {
                mesh: mesh_id,
                triangle: triangle as u32,
            },
        }
    }

    pub fn transform(&mut self, transform: &Transform) {
        for p in &mut self.positions {
            *p = transform.point(*p);
        }
        for n in &mut self.normals {
            *n = transform.normal(*n);
        }
    }
}

/// A one sided rectangular emitter, emitting on the side of `edge_u x edge_v`
#[derive(Debug, Clone)]
pub struct AreaLight {
    pub label: Option<String>,
    pub corner: Vec3,
    pub edge_u: Vec3,
    pub edge_v: Vec3,
    pub power: Rgb,
}

impl AreaLight {
    pub fn normal(&self) -> Vec3 {
        self.edge_u.cross(self.edge_v).normalize_or_zero()
    }

    pub fn area(&self) -> f32 {
        self.edge_u.cross(self.edge_v).length()
    }

    /// Point of the light for samples in [0, 1[^2
    pub fn point(&self, samples: Sample2D) -> Vec3 {
        self.corner + samples[0] * self.edge_u + samples[1] * self.edge_v
    }

    pub fn center(&self) -> Vec3 {
        self.corner + 0.5 * (self.edge_u + self.edge_v)
    }
}

/// The static scene: meshes, their materials, and the lights.
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<MaterialDescriptor>,
    pub lights: Vec<AreaLight>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// An empty scene. Material 0 is a white default material
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            materials: vec![MaterialDescriptor {
                label: Some("Default".to_owned()),
                diffuse: Box::new(crate::texture::Uniform(crate::color::linear::WHITE)),
            }],
            lights: Vec::new(),
        }
    }

    /// Insert a material and returns the Material ID associated with this material
    pub fn insert_material<T: Texture + 'static>(
        &mut self,
        label: Option<String>,
        diffuse: T,
    ) -> MaterialId {
        self.materials.push(MaterialDescriptor {
            label,
            diffuse: Box::new(diffuse),
        });
        MaterialId(self.materials.len() - 1)
    }

    pub fn insert_mesh(&mut self, mesh: Mesh) {
        debug!(
            "inserting mesh {:?} with {} triangles",
            mesh.label,
            mesh.indices.len()
        );
        self.meshes.push(mesh);
    }

    pub fn insert_light(&mut self, light: AreaLight) {
        self.lights.push(light);
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len()).sum()
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.meshes.iter().enumerate().flat_map(|(mesh_id, mesh)| {
            (0..mesh.indices.len()).map(move |t| mesh.triangle(mesh_id as u32, t))
        })
    }

    pub fn triangle(&self, id: PrimitiveId) -> Triangle {
        self.meshes[id.mesh as usize].triangle(id.mesh, id.triangle as usize)
    }

    /// Bounds of the geometry. Lights are not geometry and are not included.
    pub fn bounds(&self) -> Bounds {
        self.meshes
            .iter()
            .flat_map(|m| m.positions.iter())
            .fold(Bounds::EMPTY, |b, &p| b.union_point(p))
    }

    pub fn diffuse(&self, material: MaterialId, uv: Uv) -> Rgb {
        self.materials
            .get(material.0)
            .map(|m| m.diffuse.color(uv))
            .unwrap_or(crate::color::linear::BLACK)
    }

    /// Builds the intersection oracle over all the triangles
    pub fn build_tracer(&self) -> Bvh {
        let mut list = ShapeList::default();
        for triangle in self.triangles() {
            list.push(triangle);
        }
        Bvh::from_shapelist(list)
    }

    /// Rescale and translate the scene so its geometry fits in the unit cube, keeping proportions.
    pub fn normalize(&mut self) {
        let bounds = self.bounds();
        if bounds.is_empty() {
            return;
        }
        let extent = bounds.diag().max_element();
        let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
        let transform = Transform {
            translation: -scale * bounds.min,
            scale: Vec3::splat(scale),
            ..Default::default()
        };

        for mesh in &mut self.meshes {
            mesh.transform(&transform);
        }
        for light in &mut self.lights {
            light.corner = transform.point(light.corner);
            light.edge_u = transform.vector(light.edge_u);
            light.edge_v = transform.vector(light.edge_v);
        }
        debug!("scene normalized, scale factor {scale}");
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::examples::FloorOccluderScene;
    use crate::shape::Shape;

    #[test]
    fn normalize_fits_unit_cube() {
        let mut scene = FloorOccluderScene::build();
        for mesh in &mut scene.meshes {
            for p in &mut mesh.positions {
                *p = 3.0 * *p + Vec3::new(-2.0, 5.0, 1.0);
            }
        }
        for light in &mut scene.lights {
            light.corner = 3.0 * light.corner + Vec3::new(-2.0, 5.0, 1.0);
            light.edge_u *= 3.0;
            light.edge_v *= 3.0;
        }
        scene.normalize();

        let b = scene.bounds();
        assert!(b.min.abs().max_element() < 1e-5);
        assert!((b.diag().max_element() - 1.0).abs() < 1e-5);
        let expected = FloorOccluderScene::build();
        assert!((scene.lights[0].corner - expected.lights[0].corner).length() < 1e-5);
    }

    #[test]
    fn tracer_covers_all_triangles() {
        let scene = FloorOccluderScene::build();
        let tracer = scene.build_tracer();
        let b = tracer.bounding_box();
        assert_eq!(b, scene.bounds());
    }
}
