//! Terrain generation interface.

use isovox_voxel::VoxelTypeId;

use crate::structures::StructureId;

/// Voxels and structure placements for one world column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnSample {
    /// `(z, voxel)` pairs.
    pub column: Vec<(i32, VoxelTypeId)>,
    /// `(z, structure)` pairs; the structure is anchored at this column.
    pub structures: Vec<(i32, StructureId)>,
}

/// Supplies world columns on demand.
///
/// Implementations must be pure: the same `(x, y)` always yields the same
/// sample, so regenerating a chunk whose record was lost is safe.
pub trait TerrainGenerator: Send + Sync {
    fn generate(&self, x: i32, y: i32) -> ColumnSample;
}

/// A level slab `height` voxels thick with its top at `z = height - 1`.
#[derive(Clone, Copy, Debug)]
pub struct FlatTerrain {
    pub voxel: VoxelTypeId,
    pub height: i32,
}

impl TerrainGenerator for FlatTerrain {
    fn generate(&self, _x: i32, _y: i32) -> ColumnSample {
        ColumnSample {
            column: (0..self.height).map(|z| (z, self.voxel)).collect(),
            structures: Vec::new(),
        }
    }
}

impl<T: TerrainGenerator + ?Sized> TerrainGenerator for Box<T> {
    fn generate(&self, x: i32, y: i32) -> ColumnSample {
        (**self).generate(x, y)
    }
}
