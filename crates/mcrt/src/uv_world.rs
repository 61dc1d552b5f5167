//! What every lightmap texel is on the surface: world position, normal and diffuse color.
use glam::{UVec2, Vec2, Vec3};
use log::debug;
use rayon::prelude::*;

use crate::{
    color::Rgb,
    math::float::FloatAsExt,
    scene::{MaterialId, Scene},
    shape::{PrimitiveId, Triangle},
    texture::{texel_center, Uv},
};

/// Barycentric slack of the point in triangle test, so texels on a shared edge are not lost
const EDGE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexelRecord {
    pub position: Vec3,
    pub normal: Vec3,
    pub diffuse: Rgb,
    pub primitive: PrimitiveId,
}

/// Per texel surface records of a `size` x `size` lightmap, row major.
///
/// Texels no triangle covers have no record. When UV charts overlap the first triangle in
/// scene order wins, which ones overlap is left to the scene author.
#[derive(Debug, Clone)]
pub struct UvWorldData {
    size: u32,
    records: Vec<Option<TexelRecord>>,
}

struct UvTriangle {
    triangle: Triangle,
    material: MaterialId,
    uv_min: Vec2,
    uv_max: Vec2,
    /// Inverse of the determinant of the UV edges
    inv_det: f32,
}

impl UvTriangle {
    fn new(triangle: Triangle, material: MaterialId) -> Option<Self> {
        let [a, b, c] = triangle.uvs;
        let det = (b - a).perp_dot(c - a).into_non_zero(1e-12)?;
        triangle.area().into_non_zero(1e-12)?;

        Some(Self {
            uv_min: a.min(b).min(c),
            uv_max: a.max(b).max(c),
            inv_det: det.recip(),
            triangle,
            material,
        })
    }

    /// Barycentric coordinates (u, v) of vertices 1 and 2 if `p` is inside the UV triangle
    fn barycentric(&self, p: Uv) -> Option<(f32, f32)> {
        let [a, b, c] = self.triangle.uvs;
        let ap = p - a;
        let u = ap.perp_dot(c - a) * self.inv_det;
        let v = (b - a).perp_dot(ap) * self.inv_det;
        let inside = u >= -EDGE_EPSILON && v >= -EDGE_EPSILON && u + v <= 1.0 + EDGE_EPSILON;
        inside.then_some((u, v))
    }
}

impl UvWorldData {
    pub fn build(scene: &Scene, size: u32) -> Self {
        let triangles: Vec<UvTriangle> = scene
            .meshes
            .iter()
            .enumerate()
            .filter(|(_, mesh)| !mesh.uvs.is_empty())
            .flat_map(|(mesh_id, mesh)| {
                (0..mesh.indices.len()).map(move |t| (mesh.triangle(mesh_id as u32, t), mesh.material))
            })
            .filter_map(|(triangle, material)| UvTriangle::new(triangle, material))
            .collect();
        let skipped = scene.triangle_count() - triangles.len();
        if skipped > 0 {
            debug!("{skipped} triangles without lightmap area skipped");
        }

        let mut records = vec![None; size as usize * size as usize];
        if size > 0 {
            records
                .par_chunks_mut(size as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    let row_v = (y as f32 + 0.5) / size as f32;
                    let candidates: Vec<&UvTriangle> = triangles
                        .iter()
                        .filter(|t| t.uv_min.y <= row_v && row_v <= t.uv_max.y)
                        .collect();

                    for (x, record) in row.iter_mut().enumerate() {
                        let uv = texel_center(UVec2::new(x as u32, y as u32), size);
                        *record = candidates
                            .iter()
                            .find_map(|t| Self::record(scene, t, uv));
                    }
                });
        }

        let data = Self { size, records };
        debug!(
            "{} of {} texels cover the surface",
            data.covered_count(),
            data.records.len()
        );
        data
    }

    fn record(scene: &Scene, t: &UvTriangle, uv: Uv) -> Option<TexelRecord> {
        let (u, v) = t.barycentric(uv)?;
        Some(TexelRecord {
            position: t.triangle.position_at(u, v),
            normal: t.triangle.normal_at(u, v),
            diffuse: scene.diffuse(t.material, uv),
            primitive: t.triangle.id,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn texel_count(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, texel: UVec2) -> Option<&TexelRecord> {
        self.records
            .get(texel.y as usize * self.size as usize + texel.x as usize)?
            .as_ref()
    }

    pub fn by_index(&self, index: usize) -> Option<&TexelRecord> {
        self.records.get(index)?.as_ref()
    }

    pub fn texel(&self, index: usize) -> UVec2 {
        UVec2::new(index as u32 % self.size, index as u32 / self.size)
    }

    /// Covered texels with their records, row major
    pub fn iter(&self) -> impl Iterator<Item = (UVec2, &TexelRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (self.texel(i), r)))
    }

    pub fn covered_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, Vec2, Vec3};

    use super::UvWorldData;
    use crate::{
        color::Rgb,
        scene::{examples::quad, Mesh, MaterialId, Scene},
    };

    #[test]
    fn full_chart_covers_every_texel() {
        let mut scene = Scene::new();
        scene.insert_mesh(quad(
            "floor",
            Vec3::ZERO,
            Vec3::Z,
            Vec3::X,
            (Vec2::ZERO, Vec2::ONE),
            MaterialId(0),
        ));
        let data = UvWorldData::build(&scene, 8);

        assert_eq!(data.covered_count(), 64);
        let r = data.get(UVec2::new(1, 6)).copied().unwrap();
        // u runs along z, v along x
        assert!((r.position - Vec3::new(6.5 / 8.0, 0.0, 1.5 / 8.0)).length() < 1e-5);
        assert!((r.normal - Vec3::Y).length() < 1e-5);
        assert_eq!(r.diffuse, Rgb::splat(1.0));
    }

    #[test]
    fn first_triangle_wins_and_degenerates_are_skipped() {
        let mut scene = Scene::new();
        let chart = (Vec2::ZERO, Vec2::new(0.5, 1.0));
        scene.insert_mesh(Mesh {
            label: Some("degenerate".to_owned()),
            positions: vec![Vec3::ZERO, Vec3::X, 2.0 * Vec3::X],
            uvs: vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::ONE],
            indices: vec![[0, 1, 2]],
            ..Default::default()
        });
        scene.insert_mesh(quad("a", Vec3::ZERO, Vec3::Z, Vec3::X, chart, MaterialId(0)));
        scene.insert_mesh(quad("b", Vec3::Y, Vec3::Z, Vec3::X, chart, MaterialId(0)));

        let data = UvWorldData::build(&scene, 4);
        assert_eq!(data.covered_count(), 8);
        for (texel, r) in data.iter() {
            assert!(texel.x < 2);
            assert_eq!(r.primitive.mesh, 1);
            assert_eq!(r.position.y, 0.0);
        }
    }

    #[test]
    fn empty_texture() {
        let scene = Scene::new();
        let data = UvWorldData::build(&scene, 0);
        assert_eq!(data.texel_count(), 0);
        assert!(data.get(UVec2::ZERO).is_none());
    }
}
