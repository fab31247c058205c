//! Painter's-order visibility sort.
//!
//! Every voxel in range is projected and culled against the viewport. Fully
//! solid voxels hidden behind three fully solid camera-facing neighbours are
//! dropped outright. The rest are bucketed by the line of sight they sit on:
//! in a bucket only the solid voxel nearest the viewer survives, and
//! non-solid voxels survive only in front of it. The survivors are ordered
//! back to front.

use glam::IVec2;
use rustc_hash::FxHashMap;

use isovox_voxel::{ChunkCoord, VoxelPos, VoxelStore, VoxelTypeId, VoxelTypeRegistry};

use crate::camera::IsoCamera;
use crate::projection::Projection;

/// A voxel selected for drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleVoxel {
    pub pos: VoxelPos,
    pub voxel: VoxelTypeId,
    /// Distance towards the viewer along the view diagonal.
    pub magnitude: i32,
    /// Tile corner; refreshed every frame by [`reproject`].
    pub screen: IVec2,
}

/// Signed integer view coordinates. The camera offset is shared by every
/// voxel, so keys and magnitudes compare the same without it.
fn signed(camera: &IsoCamera, pos: VoxelPos) -> (i32, i32, i32) {
    (
        pos.x * camera.signs.x,
        pos.y * camera.signs.y,
        pos.z * camera.signs.z,
    )
}

/// Line-of-sight bucket key. Two voxels share a key exactly when one hides
/// the other.
fn sight_key(camera: &IsoCamera, pos: VoxelPos) -> (i32, i32) {
    let (wx, wy, wz) = signed(camera, pos);
    (wy - wx, wz - wx)
}

/// True when `pos` and all three of its camera-facing neighbours are fully
/// solid.
pub fn is_occluded(
    store: &VoxelStore,
    registry: &VoxelTypeRegistry,
    camera: &IsoCamera,
    pos: VoxelPos,
) -> bool {
    let solid = |p: VoxelPos| store.get(p).is_some_and(|id| registry.is_fully_solid(id));
    solid(pos) && camera.facing_neighbors(pos).into_iter().all(solid)
}

/// Builds the back-to-front draw order for chunks within `render_distance`
/// of the camera chunk.
pub fn sort_visible(
    store: &VoxelStore,
    registry: &VoxelTypeRegistry,
    camera: &IsoCamera,
    projection: &Projection,
    render_distance: u32,
) -> Vec<VisibleVoxel> {
    let center = camera.chunk(store.shift());
    let margin = projection.travel_margin(camera);
    let rd = render_distance as i32;

    let mut solid: Vec<VisibleVoxel> = Vec::new();
    let mut buckets: FxHashMap<(i32, i32), usize> = FxHashMap::default();
    let mut non_solid: Vec<VisibleVoxel> = Vec::new();
    let mut culled = 0usize;

    for dx in -rd..=rd {
        for dy in -rd..=rd {
            let Some(chunk) = store.chunk(ChunkCoord::new(center.cx + dx, center.cy + dy)) else {
                continue;
            };
            for (pos, voxel) in chunk.voxels() {
                let screen = projection.project(camera, pos);
                if !projection.footprint_visible(screen, margin) {
                    continue;
                }
                let fully_solid = registry.is_fully_solid(voxel);
                if fully_solid && is_occluded(store, registry, camera, pos) {
                    culled += 1;
                    continue;
                }

                let (wx, wy, wz) = signed(camera, pos);
                let candidate = VisibleVoxel {
                    pos,
                    voxel,
                    magnitude: wx + wy + wz,
                    screen,
                };
                if !fully_solid {
                    non_solid.push(candidate);
                    continue;
                }
                match buckets.get(&sight_key(camera, pos)) {
                    Some(&slot) => {
                        if candidate.magnitude > solid[slot].magnitude {
                            solid[slot] = candidate;
                        }
                    }
                    None => {
                        buckets.insert(sight_key(camera, pos), solid.len());
                        solid.push(candidate);
                    }
                }
            }
        }
    }

    let mut visible = solid.clone();
    visible.extend(non_solid.into_iter().filter(|v| {
        buckets
            .get(&sight_key(camera, v.pos))
            .is_none_or(|&slot| v.magnitude > solid[slot].magnitude)
    }));

    let signs = camera.signs;
    visible.sort_by_key(|v| (v.pos.z * signs.z, v.pos.x * signs.x + v.pos.y * signs.y));
    tracing::trace!("Sorted {} voxels, {culled} occluded", visible.len());
    visible
}

/// Recomputes screen positions for the current (eased) camera without
/// re-sorting.
pub fn reproject(visible: &mut [VisibleVoxel], camera: &IsoCamera, projection: &Projection) {
    for v in visible {
        v.screen = projection.project(camera, v.pos);
    }
}
