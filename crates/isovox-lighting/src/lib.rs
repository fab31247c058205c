//! Per-face light accumulation, directional flood-fill propagation, and
//! skylight seeding.

mod error;
pub mod light_field;
pub mod propagate;
pub mod skylight;

pub use error::LightingError;
pub use light_field::{FaceLight, LightField};
pub use propagate::{Emission, PropagationMode, PropagationParams, STRAIGHT_COST, propagate};
pub use skylight::{Sun, sky_emissions, sky_light};
