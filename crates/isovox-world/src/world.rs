//! The [`World`] aggregate: voxels, light, chunk states, and the shared
//! registry, plus the operations that touch more than one of them.

use std::sync::Arc;

use isovox_lighting::{
    Emission, LightField, PropagationMode, PropagationParams, Sun, propagate, sky_emissions,
};
use isovox_voxel::{ChunkCoord, VoxelPos, VoxelStore, VoxelTypeRegistry};

use crate::state::{ChunkLoadState, ChunkStates};
use crate::structures::{StructureId, StructureLibrary};

/// Column phase for texture animation, so neighbouring plants do not flip in
/// lockstep.
pub fn animation_phase(x: i32, y: i32) -> u64 {
    (x.wrapping_add(y.wrapping_mul(31)) & 63) as u64
}

pub struct World {
    registry: Arc<VoxelTypeRegistry>,
    store: VoxelStore,
    field: LightField,
    states: ChunkStates,
    params: PropagationParams,
    sun: Sun,
    structures: StructureLibrary,
}

impl World {
    pub fn new(
        registry: Arc<VoxelTypeRegistry>,
        chunk_shift: u32,
        params: PropagationParams,
        sun: Sun,
    ) -> Self {
        Self {
            registry,
            store: VoxelStore::new(chunk_shift),
            field: LightField::new(),
            states: ChunkStates::new(),
            params,
            sun,
            structures: StructureLibrary::new(),
        }
    }

    pub fn with_structures(mut self, structures: StructureLibrary) -> Self {
        self.structures = structures;
        self
    }

    pub fn registry(&self) -> &Arc<VoxelTypeRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &VoxelStore {
        &self.store
    }

    /// Direct store access. Bypasses lighting; use the edit engine for
    /// changes to lit chunks.
    pub fn store_mut(&mut self) -> &mut VoxelStore {
        &mut self.store
    }

    pub fn field(&self) -> &LightField {
        &self.field
    }

    pub fn states(&self) -> &ChunkStates {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut ChunkStates {
        &mut self.states
    }

    pub fn params(&self) -> &PropagationParams {
        &self.params
    }

    pub fn sun(&self) -> &Sun {
        &self.sun
    }

    pub fn structures(&self) -> &StructureLibrary {
        &self.structures
    }

    pub fn chunk_of(&self, pos: VoxelPos) -> ChunkCoord {
        self.store.chunk_of(pos)
    }

    /// Stamps a structure anchored at `(x, y, z)`.
    pub fn place_structure(&mut self, id: StructureId, x: i32, y: i32, z: i32) -> usize {
        self.structures
            .place(id, x, y, z, &mut self.store, &self.registry)
    }

    /// Runs one emission against the current geometry.
    pub fn propagate(&mut self, emission: &Emission, mode: PropagationMode) -> usize {
        propagate(
            &self.store,
            &self.registry,
            &mut self.field,
            emission,
            &self.params,
            mode,
        )
    }

    /// Forgets the accumulated light of one cell.
    pub fn clear_light(&mut self, pos: VoxelPos) {
        self.field.clear(pos);
    }

    /// Skylight seeds for column `(x, y)` against the current geometry.
    pub fn column_sky_emissions(&self, x: i32, y: i32) -> Vec<Emission> {
        sky_emissions(&self.store, &self.registry, &self.sun, x, y)
    }

    /// Skylight seeds for every column within `radius` (square) of `(x, y)`
    /// that belongs to a lit chunk. Columns of unlit chunks have no skylight
    /// in the field yet.
    pub fn sky_emissions_around(&self, x: i32, y: i32, radius: i32) -> Vec<Emission> {
        let shift = self.store.shift();
        let mut emissions = Vec::new();
        for cx in x - radius..=x + radius {
            for cy in y - radius..=y + radius {
                if self.states.get(ChunkCoord::containing(cx, cy, shift)).is_lit() {
                    emissions.extend(self.column_sky_emissions(cx, cy));
                }
            }
        }
        emissions
    }

    /// Lights a chunk from its registered sources and the skylight of each of
    /// its columns. Returns the number of cells expanded.
    pub fn light_chunk(&mut self, coord: ChunkCoord) -> usize {
        let mut emissions: Vec<Emission> = self
            .store
            .chunk(coord)
            .map(|chunk| chunk.sources().iter().map(Emission::from).collect())
            .unwrap_or_default();
        for (x, y) in coord.columns(self.store.shift()) {
            emissions.extend(self.column_sky_emissions(x, y));
        }

        let visited = emissions
            .iter()
            .map(|e| self.propagate(e, PropagationMode::Illuminate))
            .sum();
        tracing::debug!(
            "Lit chunk {coord:?}: {} emissions, {visited} cells",
            emissions.len()
        );
        visited
    }

    /// Discards the field and relights every lit chunk against the current
    /// geometry. Returns the number of cells expanded.
    pub fn relight_all(&mut self) -> usize {
        self.field = LightField::new();
        let mut lit: Vec<ChunkCoord> = self
            .states
            .in_state(ChunkLoadState::Lit)
            .chain(self.states.in_state(ChunkLoadState::Dirty))
            .collect();
        lit.sort_by_key(|c| (c.cx, c.cy));
        let visited = lit.iter().map(|coord| self.light_chunk(*coord)).sum();
        tracing::info!("Relit {} chunks", lit.len());
        visited
    }

    /// Advances animated voxels among `visible` to their next texture frame.
    ///
    /// Frame swaps keep light sources untouched, so animated emitters keep
    /// their original light. Returns the number of voxels changed.
    pub fn animate(&mut self, tick: u64, visible: &[VoxelPos]) -> usize {
        let mut changed = 0;
        for &pos in visible {
            let Some(id) = self.store.get(pos) else {
                continue;
            };
            let Some(info) = self.registry.get(id).and_then(|t| t.animation) else {
                continue;
            };
            let due = (tick + animation_phase(pos.x, pos.y)) % u64::from(info.ticks_per_frame) == 0;
            if due {
                self.store.set_raw(pos, info.next(id));
                changed += 1;
            }
        }
        changed
    }
}
