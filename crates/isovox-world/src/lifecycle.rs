//! Chunk loading, generation, and lighting driven around the camera.
//!
//! Each tick requests every unloaded chunk near the camera into a
//! nearest-first queue, initialises a bounded number of them, then lights a
//! bounded number of generated chunks in spiral order. A chunk is only lit once
//! all eight neighbours hold voxels, so light never spills against an
//! undefined boundary.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use isovox_voxel::{ChunkCoord, VoxelPos, chunk_serial};

use crate::error::WorldError;
use crate::ring::RingIter;
use crate::state::ChunkLoadState;
use crate::storage::ChunkStorage;
use crate::terrain::TerrainGenerator;
use crate::world::World;

/// Budgets and radii for the lifecycle.
#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    /// Chunks within this ring distance are drawn; one ring beyond is loaded.
    pub render_distance: u32,
    /// Maximum chunk initialisations per tick.
    pub loads_per_tick: u32,
    /// Maximum chunks lit per tick.
    pub chunks_per_task: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            render_distance: 7,
            loads_per_tick: 64,
            chunks_per_task: 1,
        }
    }
}

/// Priority queue of chunks awaiting initialisation, nearest first.
#[derive(Debug, Default)]
pub struct ChunkLoadQueue {
    /// Min-heap: `(distance_squared, coord)`.
    queue: BinaryHeap<Reverse<(u64, ChunkCoord)>>,
    pending: FxHashSet<ChunkCoord>,
}

impl ChunkLoadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a chunk. Duplicates are ignored.
    pub fn enqueue(&mut self, coord: ChunkCoord, dist_sq: u64) {
        if self.pending.insert(coord) {
            self.queue.push(Reverse((dist_sq, coord)));
        }
    }

    pub fn dequeue(&mut self) -> Option<ChunkCoord> {
        while let Some(Reverse((_, coord))) = self.queue.pop() {
            if self.pending.remove(&coord) {
                return Some(coord);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Squared distance between two chunk coordinates.
pub fn chunk_distance_sq(a: ChunkCoord, b: ChunkCoord) -> u64 {
    let dx = i64::from(a.cx) - i64::from(b.cx);
    let dy = i64::from(a.cy) - i64::from(b.cy);
    (dx * dx + dy * dy) as u64
}

/// How a chunk's voxels were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkOrigin {
    Loaded,
    Generated,
}

/// Result of a single lifecycle tick.
#[derive(Debug, Default)]
pub struct LifecycleTickResult {
    /// Chunks newly marked Requested.
    pub requested: u32,
    /// Chunks initialised from storage.
    pub loaded: u32,
    /// Chunks initialised by the terrain generator.
    pub generated: u32,
    /// Chunks that reached Lit.
    pub lit: Vec<ChunkCoord>,
}

#[derive(Debug)]
pub struct ChunkLifecycle {
    config: LifecycleConfig,
    load_queue: ChunkLoadQueue,
}

impl ChunkLifecycle {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            load_queue: ChunkLoadQueue::new(),
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn load_queue(&self) -> &ChunkLoadQueue {
        &self.load_queue
    }

    /// Runs one task tick: request, initialise, then light.
    pub fn tick(
        &mut self,
        camera_chunk: ChunkCoord,
        world: &mut World,
        terrain: &dyn TerrainGenerator,
        storage: &dyn ChunkStorage,
    ) -> Result<LifecycleTickResult, WorldError> {
        let mut result = LifecycleTickResult {
            requested: self.request_chunks(camera_chunk, world)?,
            ..Default::default()
        };

        for _ in 0..self.config.loads_per_tick {
            let Some(coord) = self.load_queue.dequeue() else {
                break;
            };
            if world.states().get(coord) != ChunkLoadState::Requested {
                continue;
            }
            match init_chunk(world, coord, terrain, storage)? {
                ChunkOrigin::Loaded => result.loaded += 1,
                ChunkOrigin::Generated => result.generated += 1,
            }
        }

        result.lit = self.light_chunks(camera_chunk, world)?;
        Ok(result)
    }

    /// Marks every unloaded chunk within `render_distance + 1` as Requested
    /// and queues it. Returns the number of chunks requested.
    pub fn request_chunks(
        &mut self,
        camera_chunk: ChunkCoord,
        world: &mut World,
    ) -> Result<u32, WorldError> {
        let radius = self.config.render_distance as i32 + 1;
        let mut requested = 0;
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                let coord = camera_chunk.offset(dx, dy);
                if world.states().get(coord) != ChunkLoadState::Unloaded {
                    continue;
                }
                world.states_mut().transition(coord, ChunkLoadState::Requested)?;
                self.load_queue
                    .enqueue(coord, chunk_distance_sq(coord, camera_chunk));
                requested += 1;
            }
        }
        Ok(requested)
    }

    /// Lights up to `chunks_per_task` Generated chunks whose neighbours are
    /// ready, walking the spiral around the camera.
    pub fn light_chunks(
        &mut self,
        camera_chunk: ChunkCoord,
        world: &mut World,
    ) -> Result<Vec<ChunkCoord>, WorldError> {
        let budget = self.config.chunks_per_task as usize;
        let mut lit = Vec::new();
        for (dx, dy) in RingIter::new(self.config.render_distance) {
            if lit.len() >= budget {
                break;
            }
            let coord = camera_chunk.offset(dx, dy);
            if world.states().get(coord) != ChunkLoadState::Generated {
                continue;
            }
            if !world.states().neighbors_ready(coord) {
                continue;
            }
            world.states_mut().transition(coord, ChunkLoadState::Lighting)?;
            world.light_chunk(coord);
            world.states_mut().transition(coord, ChunkLoadState::Lit)?;
            lit.push(coord);
        }
        Ok(lit)
    }
}

/// Fills a chunk from its persisted record, or from the terrain generator when
/// no usable record exists, and marks it Generated.
pub fn init_chunk(
    world: &mut World,
    coord: ChunkCoord,
    terrain: &dyn TerrainGenerator,
    storage: &dyn ChunkStorage,
) -> Result<ChunkOrigin, WorldError> {
    if world.states().get(coord) == ChunkLoadState::Unloaded {
        world.states_mut().transition(coord, ChunkLoadState::Requested)?;
    }

    let registry = Arc::clone(world.registry());
    let record = match storage.load(coord) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Failed to read chunk {coord:?}, regenerating: {e}");
            None
        }
    };
    let decoded = record.and_then(|bytes| match chunk_serial::decode(&bytes, registry.len()) {
        Ok(voxels) => Some(voxels),
        Err(e) => {
            tracing::warn!("Malformed record for chunk {coord:?}, regenerating: {e}");
            None
        }
    });

    let origin = match decoded {
        Some(voxels) => {
            let store = world.store_mut();
            store.ensure_chunk(coord);
            for (pos, voxel) in voxels {
                store.set(pos, voxel, &registry);
            }
            ChunkOrigin::Loaded
        }
        None => {
            generate_chunk(world, coord, terrain);
            ChunkOrigin::Generated
        }
    };

    if let Some(chunk) = world.store_mut().chunk_mut(coord) {
        chunk.sources_mut().compact();
    }
    world.states_mut().transition(coord, ChunkLoadState::Generated)?;
    tracing::debug!("Initialised chunk {coord:?} ({origin:?})");
    Ok(origin)
}

fn generate_chunk(world: &mut World, coord: ChunkCoord, terrain: &dyn TerrainGenerator) {
    let registry = Arc::clone(world.registry());
    let shift = world.store().shift();
    world.store_mut().ensure_chunk(coord);
    let mut placements = Vec::new();
    for (x, y) in coord.columns(shift) {
        let sample = terrain.generate(x, y);
        for (z, voxel) in sample.column {
            world.store_mut().set(VoxelPos::new(x, y, z), voxel, &registry);
        }
        placements.extend(sample.structures.into_iter().map(|(z, id)| (x, y, z, id)));
    }

    for (x, y, z, id) in placements {
        world.place_structure(id, x, y, z);
    }
}

/// Writes every Dirty chunk to `storage` and returns it to Lit. Returns the
/// number of chunks saved.
pub fn save_chunks(world: &mut World, storage: &mut dyn ChunkStorage) -> Result<usize, WorldError> {
    let dirty: Vec<ChunkCoord> = world.states().in_state(ChunkLoadState::Dirty).collect();
    for coord in &dirty {
        let record = world
            .store()
            .chunk(*coord)
            .map(|chunk| chunk_serial::encode(chunk.voxels()))
            .unwrap_or_default();
        storage.save(*coord, &record)?;
        world.states_mut().transition(*coord, ChunkLoadState::Lit)?;
    }
    if !dirty.is_empty() {
        tracing::info!("Saved {} chunks", dirty.len());
    }
    Ok(dirty.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
