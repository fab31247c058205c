//! Voxel coordinates, the type registry, sparse chunked storage, per-chunk
//! light sources, and the chunk record codec.

pub mod chunk_serial;
pub mod coords;
pub mod light_sources;
pub mod registry;
pub mod store;

pub use chunk_serial::{ChunkSerError, ENTRY_SIZE};
pub use coords::{Axis, ChunkCoord, DEFAULT_CHUNK_SHIFT, Face, VoxelPos};
pub use light_sources::{LightSource, LightSourceId, LightSourceIndex};
pub use registry::{
    FaceTextures, FrameInfo, Luminosity, MAX_SOLIDNESS, RegistryError, TileRef, VoxelType,
    VoxelTypeDef, VoxelTypeId, VoxelTypeRegistry,
};
pub use store::{Chunk, VoxelStore};
