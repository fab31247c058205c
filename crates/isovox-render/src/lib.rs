//! Isometric presentation: camera, screen projection, the painter's-order
//! visibility sort, draw-list construction, and screen-space picking.

pub mod camera;
pub mod draw;
pub mod picker;
pub mod projection;
pub mod sort_worker;
pub mod visibility;

pub use camera::IsoCamera;
pub use draw::{DrawCommand, DrawList, DrawParams, Renderer, SourceRect};
pub use picker::{PickHit, pick};
pub use projection::Projection;
pub use sort_worker::{SortResult, SortWorker};
pub use visibility::{VisibleVoxel, is_occluded, reproject, sort_visible};
