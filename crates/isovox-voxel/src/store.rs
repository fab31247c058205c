//! Sparse chunked voxel storage.
//!
//! Each [`Chunk`] keeps its voxels in a map ordered by `(x, y, z)`, so a
//! column is one contiguous range. Chunks also own the light sources of the
//! voxels they contain.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rustc_hash::FxHashMap;

use crate::coords::{ChunkCoord, VoxelPos};
use crate::light_sources::LightSourceIndex;
use crate::registry::{VoxelTypeId, VoxelTypeRegistry};

fn column_range(x: i32, y: i32) -> RangeInclusive<VoxelPos> {
    VoxelPos::new(x, y, i32::MIN)..=VoxelPos::new(x, y, i32::MAX)
}

/// The voxels and light sources of one chunk.
#[derive(Clone, Debug, Default)]
pub struct Chunk {
    voxels: BTreeMap<VoxelPos, VoxelTypeId>,
    sources: LightSourceIndex,
}

impl Chunk {
    pub fn get(&self, pos: VoxelPos) -> Option<VoxelTypeId> {
        self.voxels.get(&pos).copied()
    }

    /// All voxels ordered by `(x, y, z)`.
    pub fn voxels(&self) -> impl Iterator<Item = (VoxelPos, VoxelTypeId)> + '_ {
        self.voxels.iter().map(|(p, v)| (*p, *v))
    }

    /// Voxels of column `(x, y)`, lowest first.
    pub fn column(&self, x: i32, y: i32) -> impl DoubleEndedIterator<Item = (i32, VoxelTypeId)> + '_ {
        self.voxels.range(column_range(x, y)).map(|(p, v)| (p.z, *v))
    }

    pub fn sources(&self) -> &LightSourceIndex {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut LightSourceIndex {
        &mut self.sources
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

/// Chunk-coordinate keyed voxel map. Absence of a voxel means air.
#[derive(Clone, Debug)]
pub struct VoxelStore {
    shift: u32,
    chunks: FxHashMap<ChunkCoord, Chunk>,
}

impl VoxelStore {
    /// Creates an empty store whose chunks span `2^shift` columns per side.
    pub fn new(shift: u32) -> Self {
        Self {
            shift,
            chunks: FxHashMap::default(),
        }
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn chunk_of(&self, pos: VoxelPos) -> ChunkCoord {
        pos.chunk(self.shift)
    }

    pub fn get(&self, pos: VoxelPos) -> Option<VoxelTypeId> {
        self.chunks.get(&self.chunk_of(pos))?.get(pos)
    }

    pub fn contains(&self, pos: VoxelPos) -> bool {
        self.get(pos).is_some()
    }

    /// Places `voxel` at `pos` and returns the voxel it replaced.
    ///
    /// The replaced voxel's light source is retired and the new voxel's
    /// luminosity descriptor is registered with the owning chunk.
    pub fn set(
        &mut self,
        pos: VoxelPos,
        voxel: VoxelTypeId,
        registry: &VoxelTypeRegistry,
    ) -> Option<VoxelTypeId> {
        let chunk = self.chunks.entry(pos.chunk(self.shift)).or_default();
        let prev = chunk.voxels.insert(pos, voxel);
        if prev.is_some() {
            chunk.sources.retire(pos);
        }
        chunk.sources.register(pos, registry.luminosity(voxel));
        prev
    }

    /// Replaces the type at `pos` without touching light sources.
    pub fn set_raw(&mut self, pos: VoxelPos, voxel: VoxelTypeId) -> Option<VoxelTypeId> {
        self.chunks
            .entry(pos.chunk(self.shift))
            .or_default()
            .voxels
            .insert(pos, voxel)
    }

    /// Removes the voxel at `pos`, retiring its light source.
    pub fn delete(&mut self, pos: VoxelPos) -> Option<VoxelTypeId> {
        let chunk = self.chunks.get_mut(&pos.chunk(self.shift))?;
        let prev = chunk.voxels.remove(&pos)?;
        chunk.sources.retire(pos);
        Some(prev)
    }

    pub fn has_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Creates an empty chunk at `coord` if none exists.
    pub fn ensure_chunk(&mut self, coord: ChunkCoord) -> &mut Chunk {
        self.chunks.entry(coord).or_default()
    }

    /// Voxels of column `(x, y)`, lowest first.
    pub fn column(&self, x: i32, y: i32) -> impl DoubleEndedIterator<Item = (i32, VoxelTypeId)> + '_ {
        self.chunks
            .get(&ChunkCoord::containing(x, y, self.shift))
            .into_iter()
            .flat_map(move |chunk| chunk.column(x, y))
    }

    pub fn chunk_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Owned copy of the chunks within `radius` (square ring distance) of
    /// `center`.
    pub fn region_snapshot(&self, center: ChunkCoord, radius: u32) -> VoxelStore {
        let chunks = self
            .chunks
            .iter()
            .filter(|(coord, _)| center.ring_distance(**coord) <= radius)
            .map(|(coord, chunk)| (*coord, chunk.clone()))
            .collect();
        VoxelStore {
            shift: self.shift,
            chunks,
        }
    }
}

impl Default for VoxelStore {
    fn default() -> Self {
        Self::new(crate::coords::DEFAULT_CHUNK_SHIFT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
