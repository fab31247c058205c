//! Headless isovox driver: the application owner, the fixed-timestep loop,
//! and the built-in terrain.

pub mod app;
mod error;
pub mod game_loop;
pub mod palette;
pub mod terrain;

pub use app::{HeadlessRenderer, IsoApp};
pub use error::AppError;
pub use game_loop::{FIXED_DT, GameLoop};
