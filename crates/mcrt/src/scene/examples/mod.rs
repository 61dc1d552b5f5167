//! Procedural scenes, used by the tests and available from the command line.
mod cornell;
mod debug;

pub use cornell::CornellBox;
pub use debug::FloorOccluderScene;

use glam::{Vec2, Vec3};

use super::{MaterialId, Mesh};
use crate::texture::Uv;

/// A rectangle `corner + s * edge_u + t * edge_v`, with a flat normal along `edge_u x edge_v`.
///
/// Its lightmap chart spans `chart.0..chart.1`.
pub fn quad(
    label: &str,
    corner: Vec3,
    edge_u: Vec3,
    edge_v: Vec3,
    chart: (Uv, Uv),
    material: MaterialId,
) -> Mesh {
    let normal = edge_u.cross(edge_v).normalize_or_zero();
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    let (uv_min, uv_max) = chart;

    Mesh {
        label: Some(label.to_owned()),
        positions: corners
            .iter()
            .map(|st| corner + st.x * edge_u + st.y * edge_v)
            .collect(),
        normals: vec![normal; 4],
        uvs: corners
            .iter()
            .map(|&st| uv_min + st * (uv_max - uv_min))
            .collect(),
        indices: vec![[0, 1, 2], [0, 2, 3]],
        material,
    }
}

/// Chart `index` of a `cols` x `rows` atlas, shrunk by `margin` on every side
pub fn atlas_chart(index: u32, cols: u32, rows: u32, margin: f32) -> (Uv, Uv) {
    let size = Vec2::new(1.0 / cols as f32, 1.0 / rows as f32);
    let min = Vec2::new((index % cols) as f32, (index / cols) as f32) * size;
    (min + margin, min + size - margin)
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::{atlas_chart, quad};
    use crate::scene::MaterialId;

    #[test]
    fn quad_normal_and_uvs() {
        let m = quad(
            "floor",
            Vec3::ZERO,
            Vec3::Z,
            Vec3::X,
            (Vec2::ZERO, Vec2::splat(0.5)),
            MaterialId(0),
        );
        assert_eq!(m.normals[0], Vec3::Y);
        assert_eq!(m.uvs[2], Vec2::splat(0.5));
        assert_eq!(m.positions[2], Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn atlas_charts_do_not_overlap() {
        let (a_min, a_max) = atlas_chart(0, 3, 2, 0.01);
        let (b_min, _) = atlas_chart(1, 3, 2, 0.01);
        let (c_min, _) = atlas_chart(3, 3, 2, 0.01);
        assert!(a_max.x < b_min.x);
        assert!(a_max.y < c_min.y);
        assert_eq!(a_min, Vec2::splat(0.01));
    }
}
