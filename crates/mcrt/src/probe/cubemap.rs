//! One cubemap per non-empty cell, seen from the cell center.
//!
//! Faces are ordered +X, -X, +Y, -Y, +Z, -Z. Face coordinates follow the usual cubemap
//! convention, texel `(i, j)` of a face of resolution `res` has its center at
//! `s = 2 (i + 0.5) / res - 1`, `t = 2 (j + 0.5) / res - 1`.
use glam::{UVec2, Vec2, Vec3};

use crate::color::{linear, Rgb};

pub const FACES: usize = 6;

/// Direction through the point `st` in [-1, 1]^2 of `face`, not normalized
pub fn face_direction(face: usize, st: Vec2) -> Vec3 {
    let Vec2 { x: s, y: t } = st;
    match face {
        0 => Vec3::new(1.0, -t, -s),
        1 => Vec3::new(-1.0, -t, s),
        2 => Vec3::new(s, 1.0, t),
        3 => Vec3::new(s, -1.0, -t),
        4 => Vec3::new(s, -t, 1.0),
        _ => Vec3::new(-s, -t, -1.0),
    }
}

/// Face and face coordinates in [-1, 1]^2 of a direction
pub fn direction_face(d: Vec3) -> (usize, Vec2) {
    let a = d.abs();
    if a.x >= a.y && a.x >= a.z {
        if d.x >= 0.0 {
            (0, Vec2::new(-d.z, -d.y) / a.x)
        } else {
            (1, Vec2::new(d.z, -d.y) / a.x)
        }
    } else if a.y >= a.z {
        if d.y >= 0.0 {
            (2, Vec2::new(d.x, d.z) / a.y)
        } else {
            (3, Vec2::new(d.x, -d.z) / a.y)
        }
    } else if d.z >= 0.0 {
        (4, Vec2::new(d.x, -d.y) / a.z)
    } else {
        (5, Vec2::new(-d.x, -d.y) / a.z)
    }
}

/// Unit direction through the center of texel `texel` of `face`
pub fn texel_direction(face: usize, texel: UVec2, res: u32) -> Vec3 {
    let st = 2.0 * (texel.as_vec2() + 0.5) / res as f32 - 1.0;
    face_direction(face, st).normalize()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CubemapProbes {
    res: u32,
    cell_count: usize,
    texels: Vec<Rgb>,
}

impl CubemapProbes {
    pub fn new(cell_count: usize, res: u32) -> Self {
        Self {
            res,
            cell_count,
            texels: vec![linear::BLACK; cell_count * Self::texels_per_cell_of(res)],
        }
    }

    fn texels_per_cell_of(res: u32) -> usize {
        FACES * res as usize * res as usize
    }

    pub fn texels_per_cell(&self) -> usize {
        Self::texels_per_cell_of(self.res)
    }

    pub fn res(&self) -> u32 {
        self.res
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    fn index(&self, slot: u32, face: usize, texel: UVec2) -> usize {
        let res = self.res as usize;
        slot as usize * self.texels_per_cell()
            + face * res * res
            + texel.y as usize * res
            + texel.x as usize
    }

    pub fn get(&self, slot: u32, face: usize, texel: UVec2) -> Rgb {
        self.texels[self.index(slot, face, texel)]
    }

    /// Probes from the texels of every cell, in slot order. A cell holds its faces one after
    /// the other, each face row major.
    pub fn from_cells(res: u32, cells: Vec<Vec<Rgb>>) -> Self {
        let cell_count = cells.len();
        let texels: Vec<Rgb> = cells.into_iter().flatten().collect();
        assert_eq!(texels.len(), cell_count * Self::texels_per_cell_of(res));
        Self {
            res,
            cell_count,
            texels,
        }
    }

    /// Radiance stored in the texel `direction` goes through
    pub fn lookup(&self, slot: u32, direction: Vec3) -> Rgb {
        if self.res == 0 || slot as usize >= self.cell_count {
            return linear::BLACK;
        }
        let (face, st) = direction_face(direction);
        let max = (self.res - 1) as f32;
        let texel = ((st + 1.0) * 0.5 * self.res as f32)
            .floor()
            .clamp(Vec2::ZERO, Vec2::splat(max))
            .as_uvec2();
        self.get(slot, face, texel)
    }
}
