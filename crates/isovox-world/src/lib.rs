//! World management: chunk lifecycle, single-voxel edits with relighting,
//! structures, chunk persistence behind a background writer, and the
//! [`World`] aggregate that ties the voxel store to its light field.

pub mod edit;
mod error;
pub mod lifecycle;
pub mod ring;
pub mod state;
pub mod storage;
pub mod structures;
pub mod terrain;
pub mod world;
pub mod writer;

pub use edit::{EditEngine, EditOutcome, EditRequest, affected_sources, apply_edit};
pub use error::WorldError;
pub use lifecycle::{
    ChunkLifecycle, ChunkLoadQueue, ChunkOrigin, LifecycleConfig, LifecycleTickResult,
    init_chunk, save_chunks,
};
pub use ring::RingIter;
pub use state::{ChunkLoadState, ChunkStates};
pub use storage::{ChunkStorage, DirChunkStorage, MemoryChunkStorage, record_name};
pub use structures::{STRUCTURE_OFFSET, StructureId, StructureLibrary};
pub use terrain::{ColumnSample, FlatTerrain, TerrainGenerator};
pub use world::{World, animation_phase};
pub use writer::WriteBehindStorage;
