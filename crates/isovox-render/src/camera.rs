//! Isometric camera: an eased ground position plus the per-axis view signs
//! that encode rotation and vertical flip.

use glam::{IVec3, Vec2};
use isovox_voxel::{Axis, ChunkCoord, Face, VoxelPos};

/// Camera state for the isometric view.
///
/// `signs` holds `±1` per axis. A positive sign means the camera looks at
/// the positive face of voxels on that axis, so `x + signs.x` is the
/// neighbour standing between a voxel and the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsoCamera {
    /// Current (eased) ground position in voxel units.
    pub position: Vec2,
    /// Target the position eases towards.
    pub destination: Vec2,
    pub signs: IVec3,
    /// Fraction of the remaining distance covered per second.
    pub speed: f32,
}

impl Default for IsoCamera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            destination: Vec2::ZERO,
            signs: IVec3::ONE,
            speed: 4.0,
        }
    }
}

impl IsoCamera {
    pub fn new(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            destination: position,
            speed,
            ..Self::default()
        }
    }

    /// Quarter turn counter-clockwise.
    pub fn rotate_left(&mut self) {
        let (x, y) = (self.signs.x, self.signs.y);
        self.signs.x = y;
        self.signs.y = -x;
    }

    /// Quarter turn clockwise.
    pub fn rotate_right(&mut self) {
        let (x, y) = (self.signs.x, self.signs.y);
        self.signs.x = -y;
        self.signs.y = x;
    }

    /// Views the world from below (or back from above).
    pub fn flip(&mut self) {
        self.signs.z = -self.signs.z;
    }

    pub fn sign(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.signs.x,
            Axis::Y => self.signs.y,
            Axis::Z => self.signs.z,
        }
    }

    /// The voxel face visible to the camera on `axis`.
    pub fn facing(&self, axis: Axis) -> Face {
        Face::from_axis(axis, self.sign(axis) > 0)
    }

    /// The three neighbours of `pos` between it and the viewer.
    pub fn facing_neighbors(&self, pos: VoxelPos) -> [VoxelPos; 3] {
        [Axis::X, Axis::Y, Axis::Z].map(|axis| pos.step(self.facing(axis)))
    }

    pub fn move_to(&mut self, destination: Vec2) {
        self.destination = destination;
    }

    /// Moves the position a `speed * dt` share of the way to the
    /// destination, never overshooting it.
    pub fn ease(&mut self, dt: f32) {
        let t = (self.speed * dt).clamp(0.0, 1.0);
        self.position += (self.destination - self.position) * t;
    }

    /// Chunk under the current position.
    pub fn chunk(&self, shift: u32) -> ChunkCoord {
        Self::chunk_at(self.position, shift)
    }

    /// Chunk under the destination; chunk loading follows this one.
    pub fn destination_chunk(&self, shift: u32) -> ChunkCoord {
        Self::chunk_at(self.destination, shift)
    }

    fn chunk_at(point: Vec2, shift: u32) -> ChunkCoord {
        ChunkCoord::containing(point.x.floor() as i32, point.y.floor() as i32, shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_rotations_are_identity() {
        let mut camera = IsoCamera::default();
        camera.rotate_left();
        assert_eq!(camera.signs, IVec3::new(1, -1, 1));
        for _ in 0..3 {
            camera.rotate_left();
        }
        assert_eq!(camera.signs, IVec3::ONE);
    }

    #[test]
    fn test_rotate_right_undoes_rotate_left() {
        let mut camera = IsoCamera::default();
        camera.rotate_left();
        camera.rotate_left();
        camera.rotate_right();
        assert_eq!(camera.signs, IVec3::new(1, -1, 1));
        camera.rotate_right();
        assert_eq!(camera.signs, IVec3::ONE);
    }

    #[test]
    fn test_flip_only_touches_z() {
        let mut camera = IsoCamera::default();
        camera.flip();
        assert_eq!(camera.signs, IVec3::new(1, 1, -1));
        assert_eq!(camera.facing(Axis::Z), Face::NegZ);
        assert_eq!(
            camera.facing_neighbors(VoxelPos::new(0, 0, 0)),
            [
                VoxelPos::new(1, 0, 0),
                VoxelPos::new(0, 1, 0),
                VoxelPos::new(0, 0, -1)
            ]
        );
    }

    #[test]
    fn test_ease_converges_without_overshoot() {
        let mut camera = IsoCamera::new(Vec2::ZERO, 4.0);
        camera.move_to(Vec2::new(10.0, -10.0));
        camera.ease(0.125);
        assert_eq!(camera.position, Vec2::new(5.0, -5.0));
        camera.ease(10.0);
        assert_eq!(camera.position, camera.destination);
    }

    #[test]
    fn test_chunk_floors_negative_positions() {
        let mut camera = IsoCamera::new(Vec2::new(-0.5, 15.9), 4.0);
        assert_eq!(camera.chunk(4), ChunkCoord::new(-1, 0));
        camera.move_to(Vec2::new(16.0, -16.0));
        assert_eq!(camera.destination_chunk(4), ChunkCoord::new(1, -1));
    }
}
