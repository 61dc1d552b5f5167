//! A uniform grid of cubic cells over the scene, the support of the radiance cache.
//!
//! Cells that contain at least one lightmap texel are non-empty and own a probe. Non-empty
//! cells are numbered by ascending linear index `x + y * dx + z * dx * dy`, that number is
//! the slot of the cell in every probe buffer.
use std::sync::OnceLock;

use anyhow::{ensure, Result};
use glam::{UVec2, UVec3, Vec3};
use log::debug;

use crate::{
    math::{bounds::Bounds, float::FloatAsExt},
    scene::Scene,
    shape::{PrimitiveId, Shape},
    utils::counter::counter,
    uv_world::UvWorldData,
};

/// Fraction of the cell size a position can be outside the grid and still be assigned
pub const GRID_SLACK: f32 = 1e-3;

#[derive(Debug, Clone)]
pub struct Cell {
    pub coord: UVec3,
    pub bounds: Bounds,
    /// Lightmap texels whose surface point falls in the cell
    pub texels: Vec<UVec2>,
    /// Triangles whose bounding box touches the cell
    pub triangles: Vec<PrimitiveId>,
}

impl Cell {
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }
}

#[derive(Debug)]
pub struct RadianceGrid {
    min: Vec3,
    cell_size: f32,
    dims: UVec3,
    cells: Vec<Cell>,
    /// Linear indices of the non-empty cells, ascending. Reset by every assignment
    slots: OnceLock<Vec<u32>>,
}

impl RadianceGrid {
    /// A grid of `ceil((max - min) / cell_size)` cells per axis, at least one
    pub fn build(min: Vec3, max: Vec3, cell_size: f32) -> Result<Self> {
        ensure!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be positive, got {cell_size}"
        );
        ensure!(
            min.is_finite() && max.is_finite() && min.cmple(max).all(),
            "invalid grid bounds {min} {max}"
        );

        let dims = ((max - min) / cell_size).ceil().max(Vec3::ONE).as_uvec3();
        let count = dims.x as u64 * dims.y as u64 * dims.z as u64;
        ensure!(
            count <= u32::MAX as u64,
            "{dims} cells do not fit a 32 bits index, increase the cell size"
        );

        let cells = (0..count as u32)
            .map(|i| {
                let coord = Self::coord_of_dims(i, dims);
                Cell {
                    coord,
                    bounds: Bounds::cube(min + coord.as_vec3() * cell_size, cell_size),
                    texels: Vec::new(),
                    triangles: Vec::new(),
                }
            })
            .collect();

        debug!("radiance grid of {dims} cells of size {cell_size}");
        Ok(Self {
            min,
            cell_size,
            dims,
            cells,
            slots: OnceLock::new(),
        })
    }

    /// The grid over the scene bounds, with texels and triangles assigned
    pub fn from_scene(scene: &Scene, uv_world: &UvWorldData, cell_size: f32) -> Result<Self> {
        let bounds = scene.bounds();
        ensure!(!bounds.is_empty(), "the scene has no geometry");

        let mut grid = Self::build(bounds.min, bounds.max, cell_size)?;
        grid.assign_texels(uv_world);
        grid.assign_triangles(scene);
        Ok(grid)
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// The box the cells cover, it contains the box the grid was built from
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.min + self.dims.as_vec3() * self.cell_size)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn linear_index(&self, coord: UVec3) -> u32 {
        coord.x + coord.y * self.dims.x + coord.z * self.dims.x * self.dims.y
    }

    fn coord_of_dims(index: u32, dims: UVec3) -> UVec3 {
        UVec3::new(
            index % dims.x,
            (index / dims.x) % dims.y,
            index / (dims.x * dims.y),
        )
    }

    pub fn coord_of(&self, index: u32) -> UVec3 {
        Self::coord_of_dims(index, self.dims)
    }

    /// Cell owning `pos`: `clamp(floor((pos - min) / cell_size), 0, dim - 1)`.
    ///
    /// `None` for non finite positions and positions outside of the grid by more than the slack.
    pub fn cell_coord(&self, pos: Vec3) -> Option<UVec3> {
        if !pos.is_finite() {
            return None;
        }
        let slack = GRID_SLACK * self.cell_size;
        let bounds = self.bounds();
        if pos.cmplt(bounds.min - slack).any() || pos.cmpgt(bounds.max + slack).any() {
            return None;
        }

        Some(UVec3::new(
            pos.x.lattice_index(self.min.x, self.cell_size, self.dims.x),
            pos.y.lattice_index(self.min.y, self.cell_size, self.dims.y),
            pos.z.lattice_index(self.min.z, self.cell_size, self.dims.z),
        ))
    }

    pub fn cell(&self, coord: UVec3) -> &Cell {
        &self.cells[self.linear_index(coord) as usize]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Records that `texel` lies at `pos`, and returns the linear index of its cell.
    /// Positions outside the grid are dropped.
    pub fn assign_uv_to_cells(&mut self, texel: UVec2, pos: Vec3) -> Option<u32> {
        let Some(coord) = self.cell_coord(pos) else {
            counter!("Texels outside the grid");
            return None;
        };
        let index = self.linear_index(coord);
        self.cells[index as usize].texels.push(texel);
        self.slots = OnceLock::new();
        Some(index)
    }

    pub fn assign_texels(&mut self, uv_world: &UvWorldData) {
        let mut assigned = 0;
        for (texel, record) in uv_world.iter() {
            assigned += self.assign_uv_to_cells(texel, record.position).is_some() as usize;
        }
        debug!(
            "{assigned} texels assigned, {} non-empty cells of {}",
            self.non_empty_count(),
            self.cells.len()
        );
    }

    /// Fills the geometry proxy of every cell
    pub fn assign_triangles(&mut self, scene: &Scene) {
        for cell in &mut self.cells {
            cell.triangles.clear();
        }

        let last = self.dims - UVec3::ONE;
        for triangle in scene.triangles() {
            let b = triangle.bounding_box();
            let (Some(lo), Some(hi)) = (self.cell_coord(b.min), self.cell_coord(b.max)) else {
                continue;
            };
            // A box face lying on a cell boundary touches the cells on both sides
            let lo = lo.saturating_sub(UVec3::ONE);
            let hi = (hi + UVec3::ONE).min(last);

            for z in lo.z..=hi.z {
                for y in lo.y..=hi.y {
                    for x in lo.x..=hi.x {
                        let index = self.linear_index(UVec3::new(x, y, z)) as usize;
                        let cell = &mut self.cells[index];
                        if cell.bounds.touches(&b) {
                            cell.triangles.push(triangle.id);
                        }
                    }
                }
            }
        }
    }

    fn slots(&self) -> &[u32] {
        self.slots.get_or_init(|| {
            self.cells
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_empty())
                .map(|(i, _)| i as u32)
                .collect()
        })
    }

    /// Non-empty cells, in slot order
    pub fn non_empty_cells(&self) -> impl ExactSizeIterator<Item = &Cell> + '_ {
        self.slots().iter().map(|&i| &self.cells[i as usize])
    }

    pub fn non_empty_count(&self) -> usize {
        self.slots().len()
    }

    /// The non-empty cell in `slot`
    pub fn slot_cell(&self, slot: u32) -> Option<&Cell> {
        let index = *self.slots().get(slot as usize)?;
        Some(&self.cells[index as usize])
    }

    /// Slot of the cell at `coord`, `None` for an empty cell
    pub fn slot_of(&self, coord: UVec3) -> Option<u32> {
        let index = self.linear_index(coord);
        self.slots().binary_search(&index).ok().map(|s| s as u32)
    }

    pub fn is_occupied(&self, coord: UVec3) -> bool {
        !self.cell(coord).is_empty()
    }
}
