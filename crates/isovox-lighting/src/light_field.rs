//! Per-voxel, per-face light accumulators.

use rustc_hash::FxHashMap;

use isovox_voxel::{Face, VoxelPos};

/// Six light accumulators, one per face normal, indexed by [`Face`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FaceLight(pub [f32; 6]);

impl FaceLight {
    pub fn get(&self, face: Face) -> f32 {
        self.0[face.index()]
    }

    pub fn add(&mut self, face: Face, amount: f32) {
        self.0[face.index()] += amount;
    }

    /// Brightest of the six faces.
    pub fn max(&self) -> f32 {
        self.0.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Light accumulated on the faces of every lit voxel.
///
/// Values may go negative while a removal pass is in flight; clamping is left
/// to the draw stage.
#[derive(Clone, Debug, Default)]
pub struct LightField {
    cells: FxHashMap<VoxelPos, FaceLight>,
}

impl LightField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: VoxelPos) -> Option<&FaceLight> {
        self.cells.get(&pos)
    }

    /// Accumulator for one face, `0.0` if the cell was never lit.
    pub fn face(&self, pos: VoxelPos, face: Face) -> f32 {
        self.cells.get(&pos).map_or(0.0, |cell| cell.get(face))
    }

    /// Adds `amount` (which may be negative) to one face of `pos`.
    pub fn add(&mut self, pos: VoxelPos, face: Face, amount: f32) {
        self.cells.entry(pos).or_default().add(face, amount);
    }

    /// Forgets the cell at `pos`.
    pub fn clear(&mut self, pos: VoxelPos) -> Option<FaceLight> {
        self.cells.remove(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoxelPos, &FaceLight)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
