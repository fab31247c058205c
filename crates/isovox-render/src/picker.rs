//! Screen-point to voxel-face picking over the sorted visible list.

use glam::Vec2;
use isovox_voxel::{Axis, VoxelPos};

use crate::camera::IsoCamera;
use crate::projection::Projection;
use crate::visibility::VisibleVoxel;

/// A voxel face under the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickHit {
    pub pos: VoxelPos,
    pub face: Axis,
}

impl PickHit {
    /// The empty cell in front of the picked face, where a placed voxel
    /// goes.
    pub fn placement_target(&self, camera: &IsoCamera) -> VoxelPos {
        self.pos.step(camera.facing(self.face))
    }
}

fn edge(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
}

/// Point-in-triangle test; points on an edge count as inside.
fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d = [edge(p, a, b), edge(p, b, c), edge(p, c, a)];
    let has_neg = d.iter().any(|v| *v < 0.0);
    let has_pos = d.iter().any(|v| *v > 0.0);
    !(has_neg && has_pos)
}

enum TileHit {
    Face(Axis),
    /// The point is in a transparent corner of the tile box.
    Corner,
}

/// Classifies a point relative to the tile's top-left corner.
///
/// The tile is a hexagon inside its box: the top rim (height `o`) is the z
/// face, below it the right half is the x face and the left half the y
/// face. The four box corners outside the hexagon belong to voxels behind.
fn classify(d: Vec2, w: f32, h: f32, o: f32) -> TileHit {
    let half = w / 2.0;
    let v = Vec2::new;
    if d.y >= o && d.x >= half {
        if in_triangle(d, v(half, 2.0 * o), v(half, o), v(w, o)) {
            TileHit::Face(Axis::Z)
        } else if in_triangle(d, v(half, h), v(w, h - o), v(w, h)) {
            TileHit::Corner
        } else {
            TileHit::Face(Axis::X)
        }
    } else if d.y >= o {
        if in_triangle(d, v(0.0, o), v(half, o), v(half, 2.0 * o)) {
            TileHit::Face(Axis::Z)
        } else if in_triangle(d, v(0.0, h), v(0.0, h - o), v(half, h)) {
            TileHit::Corner
        } else {
            TileHit::Face(Axis::Y)
        }
    } else if in_triangle(d, v(0.0, 0.0), v(half, 0.0), v(0.0, o))
        || in_triangle(d, v(half, 0.0), v(w, 0.0), v(w, o))
    {
        TileHit::Corner
    } else {
        TileHit::Face(Axis::Z)
    }
}

/// Finds the front-most voxel face under `point`.
///
/// `visible` is in draw order with current screen positions, so it is
/// scanned from the back of the list (nearest the viewer) forward.
pub fn pick(visible: &[VisibleVoxel], projection: &Projection, point: Vec2) -> Option<PickHit> {
    let (w, h, o) = (
        projection.tile_width,
        projection.tile_height,
        projection.layer_offset,
    );
    for v in visible.iter().rev() {
        let corner = v.screen.as_vec2();
        let d = point - corner;
        if d.x < 0.0 || d.y < 0.0 || d.x > w || d.y > h {
            continue;
        }
        if let TileHit::Face(face) = classify(d, w, h, o) {
            return Some(PickHit { pos: v.pos, face });
        }
    }
    None
}
