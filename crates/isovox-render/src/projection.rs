//! World-to-screen isometric transform.

use glam::{IVec2, Vec2, Vec3};
use isovox_voxel::VoxelPos;

use crate::camera::IsoCamera;

/// Tile geometry and viewport size, in pixels.
///
/// A tile is `tile_width × tile_height`; `layer_offset` is the height of the
/// top rim, so one z-level raises a voxel by `tile_height - 2 * layer_offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub tile_width: f32,
    pub tile_height: f32,
    pub layer_offset: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            tile_width: 16.0,
            tile_height: 16.0,
            layer_offset: 4.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
        }
    }
}

impl Projection {
    /// Camera-relative coordinates of `pos` with the view signs applied.
    pub fn view_coords(camera: &IsoCamera, pos: VoxelPos) -> Vec3 {
        let signs = camera.signs.as_vec3();
        Vec3::new(
            (pos.x as f32 - camera.position.x) * signs.x,
            (pos.y as f32 - camera.position.y) * signs.y,
            pos.z as f32 * signs.z,
        )
    }

    /// Top-left corner of the tile for view coordinates `w`.
    pub fn project_view(&self, w: Vec3) -> IVec2 {
        let sx = self.tile_width / 2.0 * (w.x - w.y) + self.viewport_width / 2.0;
        let sy = -w.z * (self.tile_height - 2.0 * self.layer_offset)
            + (w.x + w.y) * self.layer_offset
            + self.viewport_height / 2.0;
        IVec2::new(sx.ceil() as i32, sy.ceil() as i32)
    }

    pub fn project(&self, camera: &IsoCamera, pos: VoxelPos) -> IVec2 {
        self.project_view(Self::view_coords(camera, pos))
    }

    /// Screen-space extent of the camera's remaining travel. Sorting with
    /// this margin keeps the list valid while the camera eases.
    pub fn travel_margin(&self, camera: &IsoCamera) -> Vec2 {
        let signs = camera.signs.as_vec3();
        let d = camera.destination - camera.position;
        let (dx, dy) = (d.x * signs.x, d.y * signs.y);
        Vec2::new(
            (self.tile_width / 2.0 * (dx - dy)).abs().ceil(),
            ((dx + dy) * self.layer_offset).abs().ceil(),
        )
    }

    /// Whether any part of the tile at `screen` lies inside the viewport
    /// grown by `margin` on every side.
    pub fn footprint_visible(&self, screen: IVec2, margin: Vec2) -> bool {
        let (x, y) = (screen.x as f32, screen.y as f32);
        x + self.tile_width >= -margin.x
            && y + self.tile_height >= -margin.y
            && x <= self.viewport_width + margin.x
            && y <= self.viewport_height + margin.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Projection {
        Projection {
            viewport_width: 100.0,
            viewport_height: 60.0,
            ..Projection::default()
        }
    }

    #[test]
    fn test_origin_projects_to_viewport_center() {
        let camera = IsoCamera::default();
        assert_eq!(
            projection().project(&camera, VoxelPos::new(0, 0, 0)),
            IVec2::new(50, 30)
        );
    }

    #[test]
    fn test_axis_steps() {
        let camera = IsoCamera::default();
        let p = projection();
        // +x: half a tile right, one rim down.
        assert_eq!(p.project(&camera, VoxelPos::new(1, 0, 0)), IVec2::new(58, 34));
        // +y: half a tile left, one rim down.
        assert_eq!(p.project(&camera, VoxelPos::new(0, 1, 0)), IVec2::new(42, 34));
        // +z: up by tile height minus both rims.
        assert_eq!(p.project(&camera, VoxelPos::new(0, 0, 1)), IVec2::new(50, 22));
    }

    #[test]
    fn test_rotation_mirrors_screen_x() {
        let mut camera = IsoCamera::default();
        camera.rotate_left();
        camera.rotate_left();
        let p = projection();
        assert_eq!(p.project(&camera, VoxelPos::new(1, 0, 0)), IVec2::new(42, 26));
    }

    #[test]
    fn test_fractional_camera_rounds_up() {
        let camera = IsoCamera::new(Vec2::new(0.1, 0.0), 4.0);
        // 8 * -0.1 + 50 = 49.2, -0.1 * 4 + 30 = 29.6
        assert_eq!(
            projection().project(&camera, VoxelPos::new(0, 0, 0)),
            IVec2::new(50, 30)
        );
    }

    #[test]
    fn test_footprint_visibility() {
        let p = projection();
        assert!(p.footprint_visible(IVec2::new(-16, -16), Vec2::ZERO));
        assert!(!p.footprint_visible(IVec2::new(-17, 0), Vec2::ZERO));
        assert!(!p.footprint_visible(IVec2::new(0, 61), Vec2::ZERO));
        assert!(p.footprint_visible(IVec2::new(0, 61), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn test_travel_margin_is_zero_at_rest() {
        let mut camera = IsoCamera::default();
        let p = projection();
        assert_eq!(p.travel_margin(&camera), Vec2::ZERO);
        camera.move_to(Vec2::new(2.0, 0.0));
        assert_eq!(p.travel_margin(&camera), Vec2::new(16.0, 8.0));
    }
}
