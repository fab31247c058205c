//! Single-voxel edits with local relighting.
//!
//! An edit retracts every emission that could reach the target against the
//! old geometry, mutates the voxel, then replays the same emissions against
//! the new geometry. Propagation is first-visit-wins, so a retraction over
//! unchanged geometry cancels the original contribution exactly.

use std::sync::Arc;

use isovox_lighting::{Emission, PropagationMode};
use isovox_voxel::{ChunkCoord, VoxelPos, VoxelTypeId};

use crate::error::WorldError;
use crate::world::World;

/// A requested change: place `voxel` at `pos`, or clear it when `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditRequest {
    pub pos: VoxelPos,
    pub voxel: Option<VoxelTypeId>,
}

impl EditRequest {
    pub fn place(pos: VoxelPos, voxel: VoxelTypeId) -> Self {
        Self {
            pos,
            voxel: Some(voxel),
        }
    }

    pub fn remove(pos: VoxelPos) -> Self {
        Self { pos, voxel: None }
    }
}

/// What a [`EditEngine::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing pending, or the placement interval has not elapsed.
    Idle,
    /// The pending edit targeted a chunk that is not lit and was discarded.
    Dropped(EditRequest),
    /// The edit was applied; the visibility sort is stale.
    Applied { request: EditRequest, chunk: ChunkCoord },
}

/// Rate-limited, last-write-wins edit slot.
#[derive(Debug)]
pub struct EditEngine {
    interval: f32,
    accumulator: f32,
    pending: Option<EditRequest>,
}

impl EditEngine {
    /// Allows at most `voxels_per_second` edits per second.
    pub fn new(voxels_per_second: f32) -> Self {
        Self {
            interval: 1.0 / voxels_per_second,
            accumulator: 0.0,
            pending: None,
        }
    }

    /// Minimum time between two applied edits, in seconds.
    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn pending(&self) -> Option<&EditRequest> {
        self.pending.as_ref()
    }

    /// Queues `request`, replacing any edit still pending.
    pub fn request(&mut self, request: EditRequest) {
        if let Some(previous) = self.pending.replace(request) {
            tracing::trace!("Edit at {:?} superseded", previous.pos);
        }
    }

    /// Advances the throttle by `dt` seconds and applies the pending edit once
    /// a full interval has accumulated.
    pub fn tick(&mut self, dt: f32, world: &mut World) -> Result<EditOutcome, WorldError> {
        self.accumulator += dt;
        if self.accumulator < self.interval {
            return Ok(EditOutcome::Idle);
        }
        self.accumulator -= self.interval;

        let Some(request) = self.pending.take() else {
            return Ok(EditOutcome::Idle);
        };
        let chunk = world.chunk_of(request.pos);
        let state = world.states().get(chunk);
        if !state.is_lit() {
            tracing::debug!("Dropping edit at {:?}: chunk {chunk:?} is {state:?}", request.pos);
            return Ok(EditOutcome::Dropped(request));
        }

        apply_edit(world, request)?;
        Ok(EditOutcome::Applied { request, chunk })
    }
}

/// Registered sources of lit chunks that may reach `pos`. Sources at `pos`
/// itself are excluded.
///
/// Every step costs at least [`PropagationParams::min_step_cost`], so a
/// source qualifies when `luminosity - min_step_cost * (distance - 1)` is
/// non-negative: only then can it expand a cell adjacent to `pos`. Chunks
/// that are not lit never had their sources applied and are skipped.
///
/// [`PropagationParams::min_step_cost`]: isovox_lighting::PropagationParams::min_step_cost
pub fn affected_sources(world: &World, pos: VoxelPos) -> Vec<Emission> {
    let min_cost = world.params().min_step_cost();
    let radius = chunk_search_radius(world);
    let center = world.chunk_of(pos);
    let mut found = Vec::new();
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            let coord = center.offset(dx, dy);
            if !world.states().get(coord).is_lit() {
                continue;
            }
            let Some(chunk) = world.store().chunk(coord) else {
                continue;
            };
            for source in chunk.sources().iter() {
                if source.pos == pos {
                    continue;
                }
                let distance = source.pos.manhattan(pos) as f32;
                if source.luminosity - min_cost * (distance - 1.0) >= 0.0 {
                    found.push(Emission::from(source));
                }
            }
        }
    }
    found
}

/// Chunks to scan on each side of an edit for sources that may reach it.
fn chunk_search_radius(world: &World) -> i32 {
    let reach = world.params().reach(world.registry().max_luminosity()) + 1.0;
    let span = (1i64 << world.store().shift()) as f32;
    (reach / span).ceil().max(1.0) as i32
}

/// Columns to reseed on each side of an edit.
fn sky_search_radius(world: &World) -> i32 {
    world.params().reach(world.sun().luminosity).ceil() as i32 + 1
}

/// Applies one edit with shadow-then-illuminate relighting and marks the chunk
/// Dirty. The caller is responsible for checking that the chunk is lit.
pub fn apply_edit(world: &mut World, request: EditRequest) -> Result<(), WorldError> {
    let pos = request.pos;
    let chunk = world.chunk_of(pos);
    let sky_radius = sky_search_radius(world);

    let sources = affected_sources(world, pos);
    let old_sky = world.sky_emissions_around(pos.x, pos.y, sky_radius);
    for emission in sources.iter().chain(&old_sky) {
        world.propagate(emission, PropagationMode::Shadow);
    }

    let own = world
        .store()
        .chunk(chunk)
        .and_then(|c| c.sources().at(pos))
        .map(Emission::from);
    if let Some(own) = own {
        world.propagate(&own, PropagationMode::Shadow);
    }

    let registry = Arc::clone(world.registry());
    match request.voxel {
        Some(voxel) => {
            world.store_mut().set(pos, voxel, &registry);
        }
        None => {
            world.store_mut().delete(pos);
            world.clear_light(pos);
        }
    }

    let own = world
        .store()
        .chunk(chunk)
        .and_then(|c| c.sources().at(pos))
        .map(Emission::from);
    if let Some(own) = own {
        world.propagate(&own, PropagationMode::Illuminate);
    }

    let new_sky = world.sky_emissions_around(pos.x, pos.y, sky_radius);
    for emission in sources.iter().chain(&new_sky) {
        world.propagate(emission, PropagationMode::Illuminate);
    }

    world.states_mut().mark_dirty(chunk)?;
    tracing::debug!(
        "Applied edit at {pos:?}: {} sources, {}/{} sky seeds",
        sources.len(),
        old_sky.len(),
        new_sky.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
