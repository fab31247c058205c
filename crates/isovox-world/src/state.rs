//! Per-chunk load state machine.

use rustc_hash::FxHashMap;

use isovox_voxel::ChunkCoord;

use crate::error::WorldError;

/// Where a chunk is in its lifecycle.
///
/// Ordered so that `state >= Generated` means the chunk's voxels are final
/// enough for neighbours to light against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkLoadState {
    #[default]
    Unloaded,
    /// Queued for loading or generation.
    Requested,
    /// Voxels present, not yet lit.
    Generated,
    /// Lighting in progress.
    Lighting,
    /// Lit and in sync with storage.
    Lit,
    /// Lit, with edits not yet saved.
    Dirty,
}

impl ChunkLoadState {
    /// Whether `self -> to` is a legal transition.
    pub fn can_transition(self, to: ChunkLoadState) -> bool {
        use ChunkLoadState::*;
        matches!(
            (self, to),
            (Unloaded, Requested)
                | (Requested, Generated)
                | (Generated, Lighting)
                | (Lighting, Lit)
                | (Lit, Dirty)
                | (Dirty, Lit)
        )
    }

    /// Lit or Dirty: the chunk accepts edits.
    pub fn is_lit(self) -> bool {
        matches!(self, ChunkLoadState::Lit | ChunkLoadState::Dirty)
    }
}

/// Load state of every known chunk. Unknown chunks are `Unloaded`.
#[derive(Clone, Debug, Default)]
pub struct ChunkStates {
    states: FxHashMap<ChunkCoord, ChunkLoadState>,
}

impl ChunkStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coord: ChunkCoord) -> ChunkLoadState {
        self.states.get(&coord).copied().unwrap_or_default()
    }

    /// Moves `coord` to `to`, rejecting transitions the lifecycle does not
    /// allow.
    pub fn transition(&mut self, coord: ChunkCoord, to: ChunkLoadState) -> Result<(), WorldError> {
        let from = self.get(coord);
        if !from.can_transition(to) {
            tracing::warn!("Illegal chunk transition at {coord:?}: {from:?} -> {to:?}");
            return Err(WorldError::IllegalTransition { coord, from, to });
        }
        self.states.insert(coord, to);
        Ok(())
    }

    /// Marks a lit chunk as holding unsaved edits. No-op if already dirty.
    pub fn mark_dirty(&mut self, coord: ChunkCoord) -> Result<(), WorldError> {
        if self.get(coord) == ChunkLoadState::Dirty {
            return Ok(());
        }
        self.transition(coord, ChunkLoadState::Dirty)
    }

    /// True when all eight neighbours of `coord` are at least Generated.
    pub fn neighbors_ready(&self, coord: ChunkCoord) -> bool {
        coord
            .neighbors8()
            .iter()
            .all(|n| self.get(*n) >= ChunkLoadState::Generated)
    }

    /// Chunks currently in `state`.
    pub fn in_state(&self, state: ChunkLoadState) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.states
            .iter()
            .filter(move |(_, s)| **s == state)
            .map(|(coord, _)| *coord)
    }

    pub fn count(&self, state: ChunkLoadState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChunkLoadState::*;

    #[test]
    fn test_unknown_chunk_is_unloaded() {
        let states = ChunkStates::new();
        assert_eq!(states.get(ChunkCoord::new(9, -9)), Unloaded);
    }

    #[test]
    fn test_forward_path_is_legal() {
        let mut states = ChunkStates::new();
        let c = ChunkCoord::new(0, 0);
        for to in [Requested, Generated, Lighting, Lit, Dirty, Lit] {
            states.transition(c, to).unwrap();
            assert_eq!(states.get(c), to);
        }
    }

    #[test]
    fn test_skipping_states_rejected() {
        let mut states = ChunkStates::new();
        let c = ChunkCoord::new(1, 2);
        let err = states.transition(c, Lit).unwrap_err();
        assert!(matches!(
            err,
            WorldError::IllegalTransition {
                from: Unloaded,
                to: Lit,
                ..
            }
        ));
        assert_eq!(states.get(c), Unloaded, "state unchanged on error");

        states.transition(c, Requested).unwrap();
        states.transition(c, Generated).unwrap();
        assert!(states.transition(c, Requested).is_err(), "no going back");
        assert!(states.mark_dirty(c).is_err(), "unlit chunk cannot be dirty");
    }

    #[test]
    fn test_mark_dirty_is_idempotent() {
        let mut states = ChunkStates::new();
        let c = ChunkCoord::new(0, 0);
        for to in [Requested, Generated, Lighting, Lit] {
            states.transition(c, to).unwrap();
        }
        states.mark_dirty(c).unwrap();
        states.mark_dirty(c).unwrap();
        assert_eq!(states.get(c), Dirty);
        assert_eq!(states.count(Dirty), 1);
    }

    #[test]
    fn test_neighbors_ready_needs_all_eight() {
        let mut states = ChunkStates::new();
        let center = ChunkCoord::new(0, 0);
        let neighbors = center.neighbors8();
        for n in &neighbors[..7] {
            states.transition(*n, Requested).unwrap();
            states.transition(*n, Generated).unwrap();
        }
        assert!(!states.neighbors_ready(center));

        states.transition(neighbors[7], Requested).unwrap();
        assert!(!states.neighbors_ready(center), "requested is not enough");
        states.transition(neighbors[7], Generated).unwrap();
        assert!(states.neighbors_ready(center));
    }
}
