//! Draw-list construction from the sorted visible set.

use isovox_lighting::LightField;
use isovox_voxel::{Axis, FaceTextures, TileRef, VoxelStore, VoxelTypeRegistry};

use crate::camera::IsoCamera;
use crate::projection::Projection;
use crate::visibility::VisibleVoxel;

/// Atlas region in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SourceRect {
    pub fn for_tile(tile: TileRef, projection: &Projection) -> Self {
        Self {
            x: f32::from(tile.col) * projection.tile_width,
            y: f32::from(tile.row) * projection.tile_height,
            width: projection.tile_width,
            height: projection.tile_height,
        }
    }
}

/// One textured tile blit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub screen_x: i32,
    pub screen_y: i32,
    pub source: SourceRect,
    /// Multiplier in `[0, 1]`.
    pub brightness: f32,
    /// Fog blend in `[0, 1]`.
    pub depth_fog: f32,
}

/// Backend that rasterizes a frame's commands in order.
pub trait Renderer {
    fn submit(&mut self, commands: &[DrawCommand]);
}

/// Light clamping and fog settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    pub min_light: f32,
    pub max_light: f32,
    pub fog_scale: f32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            min_light: 3.0,
            max_light: 16.0,
            fog_scale: 200.0,
        }
    }
}

impl DrawParams {
    pub fn brightness(&self, light: f32) -> f32 {
        (light.max(self.min_light) / self.max_light).min(1.0)
    }

    /// Fog grows with the squared diagonal distance from the camera.
    pub fn fog(&self, dx: f32, dy: f32) -> f32 {
        ((dx + dy).abs() / self.fog_scale).min(1.0).powi(2)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Builds the commands for `visible`, which must already be in draw
    /// order and reprojected for `camera`.
    ///
    /// Voxels are re-read from `store` so frame swaps made since the sort
    /// show up; voxels deleted since then are skipped.
    pub fn build(
        visible: &[VisibleVoxel],
        store: &VoxelStore,
        field: &LightField,
        registry: &VoxelTypeRegistry,
        camera: &IsoCamera,
        projection: &Projection,
        params: &DrawParams,
    ) -> Self {
        let mut commands = Vec::with_capacity(visible.len());
        for v in visible {
            if !projection.footprint_visible(v.screen, glam::Vec2::ZERO) {
                continue;
            }
            let Some(voxel_type) = store.get(v.pos).and_then(|id| registry.get(id)) else {
                continue;
            };
            let depth_fog = params.fog(
                v.pos.x as f32 - camera.position.x,
                v.pos.y as f32 - camera.position.y,
            );
            let light = field.get(v.pos).copied().unwrap_or_default();
            let mut emit = |tile: TileRef, value: f32| {
                commands.push(DrawCommand {
                    screen_x: v.screen.x,
                    screen_y: v.screen.y,
                    source: SourceRect::for_tile(tile, projection),
                    brightness: params.brightness(value),
                    depth_fog,
                });
            };
            match voxel_type.texture {
                FaceTextures::Cube { .. } => {
                    for axis in [Axis::X, Axis::Y, Axis::Z] {
                        let value = light.get(camera.facing(axis));
                        emit(voxel_type.texture.tile(axis), value);
                    }
                }
                FaceTextures::Single(tile) => emit(tile, light.max()),
            }
        }
        Self { commands }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn submit(&self, renderer: &mut dyn Renderer) {
        renderer.submit(&self.commands);
    }
}
