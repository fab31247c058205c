//! World and chunk coordinates, axes, and the six face normals.
//!
//! Chunks are horizontal tiles of `2^shift × 2^shift` columns with unbounded
//! height, so a [`ChunkCoord`] only carries the horizontal pair.

use serde::{Deserialize, Serialize};

/// Default chunk-size exponent: a chunk spans 16 × 16 columns.
pub const DEFAULT_CHUNK_SHIFT: u32 = 4;

/// An integer voxel position in world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelPos {
    /// World X.
    pub x: i32,
    /// World Y.
    pub y: i32,
    /// World Z (height).
    pub z: i32,
}

impl VoxelPos {
    /// Creates a new position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the neighbouring position across `face`.
    pub fn step(self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the chunk that owns this position's column.
    pub fn chunk(self, shift: u32) -> ChunkCoord {
        ChunkCoord::containing(self.x, self.y, shift)
    }

    /// Manhattan distance to `other`.
    pub fn manhattan(self, other: VoxelPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }
}

/// Identifies a chunk by its horizontal grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk-grid X.
    pub cx: i32,
    /// Chunk-grid Y.
    pub cy: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Returns the chunk containing world column `(x, y)`.
    ///
    /// Uses an arithmetic shift so negative coordinates floor toward −∞.
    pub fn containing(x: i32, y: i32, shift: u32) -> Self {
        Self::new(x >> shift, y >> shift)
    }

    /// Returns the chunk offset by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.cx + dx, self.cy + dy)
    }

    /// The eight surrounding chunks.
    pub fn neighbors8(self) -> [ChunkCoord; 8] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(-1, -1),
            self.offset(1, 1),
            self.offset(-1, 1),
            self.offset(1, -1),
        ]
    }

    /// World X/Y of this chunk's first column.
    pub fn origin(self, shift: u32) -> (i32, i32) {
        (self.cx << shift, self.cy << shift)
    }

    /// Iterates over every world column `(x, y)` inside the chunk.
    pub fn columns(self, shift: u32) -> impl Iterator<Item = (i32, i32)> {
        let (ox, oy) = self.origin(shift);
        let span = 1i32 << shift;
        (0..span).flat_map(move |dx| (0..span).map(move |dy| (ox + dx, oy + dy)))
    }

    /// Chebyshev (square-ring) distance to `other`.
    pub fn ring_distance(self, other: ChunkCoord) -> u32 {
        self.cx.abs_diff(other.cx).max(self.cy.abs_diff(other.cy))
    }
}

/// One of the three world axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// World X.
    X,
    /// World Y.
    Y,
    /// World Z (vertical).
    Z,
}

/// One of the six axis-aligned face normals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    /// +X
    PosX = 0,
    /// −X
    NegX = 1,
    /// +Y
    PosY = 2,
    /// −Y
    NegY = 3,
    /// +Z
    PosZ = 4,
    /// −Z
    NegZ = 5,
}

impl Face {
    /// Flood-fill neighbour order: all positive directions, then all negative.
    pub const TRAVERSAL: [Face; 6] = [
        Face::PosX,
        Face::PosY,
        Face::PosZ,
        Face::NegX,
        Face::NegY,
        Face::NegZ,
    ];

    /// Builds a face from an axis and the sign of its normal.
    pub fn from_axis(axis: Axis, positive: bool) -> Face {
        match (axis, positive) {
            (Axis::X, true) => Face::PosX,
            (Axis::X, false) => Face::NegX,
            (Axis::Y, true) => Face::PosY,
            (Axis::Y, false) => Face::NegY,
            (Axis::Z, true) => Face::PosZ,
            (Axis::Z, false) => Face::NegZ,
        }
    }

    /// The axis this face is perpendicular to.
    pub fn axis(self) -> Axis {
        match self {
            Face::PosX | Face::NegX => Axis::X,
            Face::PosY | Face::NegY => Axis::Y,
            Face::PosZ | Face::NegZ => Axis::Z,
        }
    }

    /// `true` for the positive faces.
    pub fn is_positive(self) -> bool {
        matches!(self, Face::PosX | Face::PosY | Face::PosZ)
    }

    /// Direction along the axis: `1` or `-1`.
    pub fn sign(self) -> i32 {
        if self.is_positive() { 1 } else { -1 }
    }

    /// Returns the opposite face.
    pub fn opposite(self) -> Face {
        match self {
            Face::PosX => Face::NegX,
            Face::NegX => Face::PosX,
            Face::PosY => Face::NegY,
            Face::NegY => Face::PosY,
            Face::PosZ => Face::NegZ,
            Face::NegZ => Face::PosZ,
        }
    }

    /// Unit offset along the face normal.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    /// Index into per-face arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_of_negative_coordinate_floors() {
        assert_eq!(ChunkCoord::containing(-1, -16, 4), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::containing(-17, 15, 4), ChunkCoord::new(-2, 0));
        assert_eq!(ChunkCoord::containing(16, 31, 4), ChunkCoord::new(1, 1));
    }

    #[test]
    fn test_columns_cover_chunk_exactly() {
        let coord = ChunkCoord::new(-1, 2);
        let columns: Vec<_> = coord.columns(4).collect();
        assert_eq!(columns.len(), 256);
        assert!(
            columns
                .iter()
                .all(|&(x, y)| ChunkCoord::containing(x, y, 4) == coord)
        );
    }

    #[test]
    fn test_face_opposite_is_involution() {
        for face in Face::TRAVERSAL {
            assert_eq!(face.opposite().opposite(), face);
            assert_eq!(face.opposite().axis(), face.axis());
            assert_ne!(face.opposite().is_positive(), face.is_positive());
        }
    }

    #[test]
    fn test_from_axis_roundtrips() {
        for face in Face::TRAVERSAL {
            assert_eq!(Face::from_axis(face.axis(), face.is_positive()), face);
        }
    }

    #[test]
    fn test_neighbors8_are_distinct_and_adjacent() {
        let center = ChunkCoord::new(3, -2);
        let neighbors = center.neighbors8();
        for (i, n) in neighbors.iter().enumerate() {
            assert_eq!(center.ring_distance(*n), 1);
            assert!(!neighbors[i + 1..].contains(n), "duplicate neighbour {n:?}");
        }
    }
}
