use thiserror::Error;

use isovox_voxel::ChunkCoord;

use crate::state::ChunkLoadState;

/// Errors surfaced by world management.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A chunk was asked to move between two states that are not adjacent in
    /// its lifecycle.
    #[error("illegal chunk transition at {coord:?}: {from:?} -> {to:?}")]
    IllegalTransition {
        coord: ChunkCoord,
        from: ChunkLoadState,
        to: ChunkLoadState,
    },
    /// The chunk storage backend failed.
    #[error("chunk storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The background chunk writer is gone.
    #[error("chunk writer has stopped")]
    WriterStopped,
    /// Records the background writer could not persist since the last flush.
    #[error("{0} chunk records failed to write")]
    WriteFailed(usize),
}
