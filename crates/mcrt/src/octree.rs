//! Grid occupancy as an octree, and its flat indirection grid form.
//!
//! The flat form is a grid of `res^3` blocks, each block holding the 8 children of one
//! internal node, stored block after block. An entry is an RGBA `f32` quadruple:
//! - a leaf is `(occupancy, 0, 0, 1.0)`,
//! - an internal node is `(bx, by, bz, 0.5)`, the grid coordinate of the block of its children.
//!
//! Block 0 holds the children of the root. Blocks are allocated breadth first.
use std::{
    collections::VecDeque,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{bail, ensure, Context, Result};
use glam::{UVec3, Vec3};
use log::{debug, info};

use crate::{
    grid::RadianceGrid,
    math::{bounds::Bounds, float::FloatAsExt},
    utils::progress::Progress,
};

pub const OCTREE_MAGIC: &[u8; 8] = b"MCRTOCT1";
/// Magic, then max depth, resolution and entry count as `u32`
const OCTREE_HEADER_LEN: u64 = 8 + 5 * 4;

const LEAF: f32 = 1.0;
const INTERNAL: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub bounds: Bounds,
    pub depth: u32,
    /// True if the node overlaps an occupied cell
    pub occupied: bool,
    pub children: Option<Box<[OctreeNode; 8]>>,
}

impl OctreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn visit<F: FnMut(&OctreeNode)>(&self, f: &mut F) {
        f(self);
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.visit(f);
            }
        }
    }
}

/// Builds an [Octree] top down from the occupancy of a [RadianceGrid]
pub struct OctreeBuilder<'a> {
    grid: &'a RadianceGrid,
    max_depth: u32,
    report_depth: u32,
    progress: Progress,
}

impl<'a> OctreeBuilder<'a> {
    pub fn new(grid: &'a RadianceGrid, max_depth: u32) -> Self {
        let report_depth = max_depth.min(2);
        Self {
            grid,
            max_depth,
            report_depth,
            progress: Progress::new(8usize.pow(report_depth)),
        }
    }

    pub fn build(self) -> Octree {
        let root_bounds = self.grid.bounds().enclosing_cube();
        let root = self.build_node(root_bounds, 0);
        let octree = Octree {
            root,
            max_depth: self.max_depth,
        };
        debug!(
            "octree of depth {}: {} nodes, {} leaves, {} occupied",
            octree.max_depth,
            octree.node_count(),
            octree.leaf_count(),
            octree.occupied_leaf_count()
        );
        octree
    }

    fn build_node(&self, bounds: Bounds, depth: u32) -> OctreeNode {
        let occupied = self.overlaps_occupied_cell(&bounds);
        let children = (occupied && depth < self.max_depth).then(|| {
            Box::new(std::array::from_fn(|i| {
                self.build_node(bounds.octant(i), depth + 1)
            }))
        });

        if depth == self.report_depth {
            self.increase_progress(1);
        } else if depth < self.report_depth && children.is_none() {
            // The subtree stops early, count the nodes it would have had
            self.increase_progress(8usize.pow(self.report_depth - depth));
        }

        OctreeNode {
            bounds,
            depth,
            occupied,
            children,
        }
    }

    fn overlaps_occupied_cell(&self, bounds: &Bounds) -> bool {
        let grid = self.grid;
        let (min, size, dims) = (grid.min(), grid.cell_size(), grid.dims());
        let lo = UVec3::new(
            bounds.min.x.lattice_index(min.x, size, dims.x),
            bounds.min.y.lattice_index(min.y, size, dims.y),
            bounds.min.z.lattice_index(min.z, size, dims.z),
        );
        let hi = UVec3::new(
            bounds.max.x.lattice_index(min.x, size, dims.x),
            bounds.max.y.lattice_index(min.y, size, dims.y),
            bounds.max.z.lattice_index(min.z, size, dims.z),
        );

        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let cell = grid.cell(UVec3::new(x, y, z));
                    if !cell.is_empty() && cell.bounds.overlaps(bounds) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Logs the build progress, counted in nodes of the reporting depth
    pub fn increase_progress(&self, k: usize) {
        let before = self.progress.add(k);
        let step = (self.progress.get_raw() * 10) / 8usize.pow(self.report_depth).max(1);
        if step != (before * 10) / 8usize.pow(self.report_depth).max(1) {
            info!("building octree {}", self.progress);
        }
    }
}

/// The pointer form of the octree, owned by the builder
#[derive(Debug, Clone)]
pub struct Octree {
    pub root: OctreeNode,
    pub max_depth: u32,
}

impl Octree {
    pub fn bounds(&self) -> Bounds {
        self.root.bounds
    }

    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.root.visit(&mut |_| n += 1);
        n
    }

    pub fn leaf_count(&self) -> usize {
        let mut n = 0;
        self.root.visit(&mut |node| n += node.is_leaf() as usize);
        n
    }

    pub fn occupied_leaf_count(&self) -> usize {
        let mut n = 0;
        self.root
            .visit(&mut |node| n += (node.is_leaf() && node.occupied) as usize);
        n
    }

    /// Occupancy of the leaf containing `p`, `None` outside of the root cube
    pub fn lookup(&self, p: Vec3) -> Option<bool> {
        if !self.root.bounds.contains(p) {
            return None;
        }
        let mut node = &self.root;
        while let Some(children) = &node.children {
            node = &children[node.bounds.octant_index(p)];
        }
        Some(node.occupied)
    }

    /// Point of the root cube mapped to [0, 1]^3, the space [GpuOctree::lookup] works in
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        (p - self.root.bounds.min) / self.root.bounds.diag()
    }

    /// Flattens the tree breadth first in an indirection grid of `res^3` blocks
    pub fn serialize(&self, res: u32) -> Result<GpuOctree> {
        ensure!(res > 0, "the indirection grid can not be empty");
        let block_capacity = res as u64 * res as u64 * res as u64;
        let block_coord = |block: u64| {
            let block = block as u32;
            [block % res, (block / res) % res, block / (res * res)].map(|c| c as f32)
        };

        let mut entries = Vec::new();
        let mut next_block = 1u64;
        let mut queue = VecDeque::from([&self.root]);

        while let Some(node) = queue.pop_front() {
            match &node.children {
                Some(children) => {
                    for child in children.iter() {
                        if child.is_leaf() {
                            entries.push([child.occupied as u32 as f32, 0.0, 0.0, LEAF]);
                        } else {
                            if next_block >= block_capacity {
                                bail!(
                                    "octree does not fit a {res}^3 indirection grid, \
                                     increase its resolution or reduce the depth"
                                );
                            }
                            let [bx, by, bz] = block_coord(next_block);
                            entries.push([bx, by, bz, INTERNAL]);
                            next_block += 1;
                            queue.push_back(child);
                        }
                    }
                }
                // A leaf root still gets a block, so lookups always start from block 0
                None => {
                    entries.extend([[node.occupied as u32 as f32, 0.0, 0.0, LEAF]; 8]);
                }
            }
        }

        debug!("octree serialized in {next_block} blocks of {block_capacity}");
        Ok(GpuOctree {
            max_depth: self.max_depth,
            res: UVec3::splat(res),
            entries,
        })
    }
}

/// The flat, read only form of an [Octree]
#[derive(Debug, Clone, PartialEq)]
pub struct GpuOctree {
    pub max_depth: u32,
    /// Indirection grid resolution, in blocks
    pub res: UVec3,
    /// 8 entries per used block, block after block
    pub entries: Vec<[f32; 4]>,
}

impl GpuOctree {
    pub fn block_count(&self) -> usize {
        self.entries.len() / 8
    }

    fn block_index(&self, [bx, by, bz]: [f32; 3]) -> usize {
        let (x, y, z) = (bx as usize, by as usize, bz as usize);
        x + y * self.res.x as usize + z * self.res.x as usize * self.res.y as usize
    }

    /// Occupancy of the leaf containing `p`, a point of the root cube mapped to [0, 1]^3.
    ///
    /// `None` outside of the cube, or if the entries are inconsistent.
    pub fn lookup(&self, p: Vec3) -> Option<bool> {
        if !p.cmpge(Vec3::ZERO).all() || !p.cmple(Vec3::ONE).all() {
            return None;
        }
        let mut bounds = Bounds::cube(Vec3::ZERO, 1.0);
        let mut block = 0;

        for _ in 0..=self.max_depth {
            let child = bounds.octant_index(p);
            let [r, g, b, a] = *self.entries.get(block * 8 + child)?;
            if a == LEAF {
                return Some(r > 0.0);
            }
            if a != INTERNAL {
                return None;
            }
            block = self.block_index([r, g, b]);
            bounds = bounds.octant(child);
        }
        None
    }

    pub fn save_octree_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut w = BufWriter::new(file);

        w.write_all(OCTREE_MAGIC)?;
        for v in [
            self.max_depth,
            self.res.x,
            self.res.y,
            self.res.z,
            self.entries.len() as u32,
        ] {
            w.write_all(&v.to_le_bytes())?;
        }
        for entry in &self.entries {
            for c in entry {
                w.write_all(&c.to_le_bytes())?;
            }
        }
        w.flush()
            .with_context(|| format!("writing {}", path.display()))?;
        info!("octree saved to {}", path.display());
        Ok(())
    }

    pub fn load_octree_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let file_len = file
            .metadata()
            .with_context(|| format!("reading {}", path.display()))?
            .len();
        let mut r = BufReader::new(file);

        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)
            .with_context(|| format!("reading {}", path.display()))?;
        ensure!(&magic == OCTREE_MAGIC, "{} is not an octree file", path.display());

        let mut read_u32 = || -> Result<u32> {
            let mut buf = [0u8; 4];
            r.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf))
        };
        let max_depth = read_u32()?;
        let res = UVec3::new(read_u32()?, read_u32()?, read_u32()?);
        let entry_count = read_u32()? as usize;
        let capacity = res.x as u64 * res.y as u64 * res.z as u64 * 8;
        ensure!(
            entry_count % 8 == 0 && entry_count as u64 <= capacity,
            "{entry_count} entries do not fit a {res} indirection grid"
        );
        let payload = file_len.saturating_sub(OCTREE_HEADER_LEN);
        ensure!(
            entry_count as u64 * 16 == payload,
            "{} announces {entry_count} entries but holds {payload} bytes of them",
            path.display()
        );

        let mut bytes = vec![0u8; entry_count * 16];
        r.read_exact(&mut bytes)
            .with_context(|| format!("{} is truncated", path.display()))?;
        let entries = bytes
            .chunks_exact(16)
            .map(|entry| {
                std::array::from_fn(|c| {
                    let b = &entry[4 * c..4 * c + 4];
                    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
                })
            })
            .collect();

        Ok(Self {
            max_depth,
            res,
            entries,
        })
    }

    /// One entry per line: `block child: r g b a`
    pub fn write_gpu_octree_to_txt_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(
            w,
            "# max depth {}, indirection grid {}, {} blocks",
            self.max_depth,
            self.res,
            self.block_count()
        )?;
        for (i, [r, g, b, a]) in self.entries.iter().enumerate() {
            writeln!(w, "{} {}: {r} {g} {b} {a}", i / 8, i % 8)?;
        }
        w.flush()
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, UVec3, Vec3};

    use super::{GpuOctree, OctreeBuilder};
    use crate::{grid::RadianceGrid, scene::examples::FloorOccluderScene, uv_world::UvWorldData};

    fn floor_grid() -> RadianceGrid {
        let scene = FloorOccluderScene::build();
        let uv_world = UvWorldData::build(&scene, 32);
        RadianceGrid::from_scene(&scene, &uv_world, 0.25).unwrap()
    }

    #[test]
    fn leaves_follow_the_grid() {
        let grid = floor_grid();
        // Unit cube and 0.25 cells: leaves at depth 2 are exactly the cells
        let octree = OctreeBuilder::new(&grid, 2).build();
        let gpu = octree.serialize(8).unwrap();

        for cell in grid.cells() {
            let c = cell.center();
            assert_eq!(octree.lookup(c), Some(!cell.is_empty()), "{:?}", cell.coord);
            assert_eq!(gpu.lookup(octree.to_local(c)), Some(!cell.is_empty()));
        }
    }

    #[test]
    fn internal_nodes_are_occupied() {
        let grid = floor_grid();
        let octree = OctreeBuilder::new(&grid, 4).build();
        let mut ok = true;
        octree.root.visit(&mut |node| ok &= node.is_leaf() || node.occupied);
        assert!(ok);
        assert!(octree.occupied_leaf_count() > 0);
        assert!(octree.leaf_count() < octree.node_count());
    }

    #[test]
    fn file_round_trip() {
        let grid = floor_grid();
        let gpu = OctreeBuilder::new(&grid, 3).build().serialize(8).unwrap();

        let dir = std::env::temp_dir();
        let path = dir.join(format!("mcrt-octree-{}.bin", std::process::id()));
        let path2 = dir.join(format!("mcrt-octree-{}-2.bin", std::process::id()));
        gpu.save_octree_to_file(&path).unwrap();
        let loaded = GpuOctree::load_octree_from_file(&path).unwrap();
        assert_eq!(loaded, gpu);

        loaded.save_octree_to_file(&path2).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), std::fs::read(&path2).unwrap());

        let txt = dir.join(format!("mcrt-octree-{}.txt", std::process::id()));
        gpu.write_gpu_octree_to_txt_file(&txt).unwrap();
        let lines = std::fs::read_to_string(&txt).unwrap().lines().count();
        assert_eq!(lines, gpu.entries.len() + 1);

        for p in [path, path2, txt] {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn corrupt_header_is_an_error() {
        let path = std::env::temp_dir().join(format!("mcrt-octree-{}-bad.bin", std::process::id()));
        let mut bytes = super::OCTREE_MAGIC.to_vec();
        for v in [4u32, 2048, 2048, 2048, u32::MAX - 7] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();
        assert!(GpuOctree::load_octree_from_file(&path).is_err());

        // A well formed header with a missing payload
        let gpu = OctreeBuilder::new(&floor_grid(), 3).build().serialize(8).unwrap();
        gpu.save_octree_to_file(&path).unwrap();
        let full = std::fs::read(&path).unwrap();
        std::fs::write(&path, &full[..full.len() - 16]).unwrap();
        assert!(GpuOctree::load_octree_from_file(&path).is_err());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn overflowing_indirection_grid_is_an_error() {
        let grid = floor_grid();
        let octree = OctreeBuilder::new(&grid, 3).build();
        assert!(octree.serialize(1).is_err());
    }

    #[test]
    fn empty_grid_gives_a_single_leaf_block() {
        let mut grid = RadianceGrid::build(Vec3::ZERO, Vec3::ONE, 0.5).unwrap();
        let octree = OctreeBuilder::new(&grid, 3).build();
        assert_eq!(octree.node_count(), 1);
        let gpu = octree.serialize(1).unwrap();
        assert_eq!(gpu.block_count(), 1);
        assert_eq!(gpu.lookup(Vec3::splat(0.3)), Some(false));

        grid.assign_uv_to_cells(UVec2::ZERO, Vec3::splat(0.9));
        let octree = OctreeBuilder::new(&grid, 1).build();
        assert_eq!(octree.lookup(Vec3::splat(0.9)), Some(true));
        assert_eq!(octree.lookup(Vec3::splat(0.1)), Some(false));
        assert_eq!(grid.cell(UVec3::ONE).texels.len(), 1);
    }
}
