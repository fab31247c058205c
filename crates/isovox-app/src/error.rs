use thiserror::Error;

use isovox_lighting::LightingError;
use isovox_voxel::RegistryError;
use isovox_world::WorldError;

/// Errors that stop the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("voxel registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("lighting: {0}")]
    Lighting(#[from] LightingError),

    #[error("world: {0}")]
    World(#[from] WorldError),

    /// The terrain palette names a type the registry does not define.
    #[error("voxel type `{0}` is not registered")]
    MissingVoxel(&'static str),

    #[error("no data directory available for world saves")]
    NoDataDir,
}
