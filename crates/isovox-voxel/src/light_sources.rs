//! Per-chunk arena of light-emitting voxels.
//!
//! Retiring a source leaves a tombstone so outstanding [`LightSourceId`]s stay
//! valid until the next [`LightSourceIndex::compact`].

use rustc_hash::FxHashMap;

use crate::coords::{Face, VoxelPos};
use crate::registry::Luminosity;

/// Index of a slot in a chunk's [`LightSourceIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LightSourceId(pub u32);

/// A registered emitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    pub pos: VoxelPos,
    pub luminosity: f32,
    pub face: Face,
    pub self_luminosity: f32,
}

impl LightSource {
    pub fn new(pos: VoxelPos, descriptor: Luminosity) -> Self {
        Self {
            pos,
            luminosity: descriptor.value,
            face: descriptor.face,
            self_luminosity: descriptor.self_luminosity,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LightSourceIndex {
    slots: Vec<Option<LightSource>>,
    by_pos: FxHashMap<VoxelPos, LightSourceId>,
}

impl LightSourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the emitter described by `descriptor` at `pos`.
    ///
    /// Inert descriptors are discarded and return `None`. A live source at the
    /// same position is retired first.
    pub fn register(&mut self, pos: VoxelPos, descriptor: Luminosity) -> Option<LightSourceId> {
        if descriptor.is_inert() {
            return None;
        }
        self.retire(pos);
        let id = LightSourceId(self.slots.len() as u32);
        self.slots.push(Some(LightSource::new(pos, descriptor)));
        self.by_pos.insert(pos, id);
        Some(id)
    }

    /// Tombstones the source at `pos`, returning it if one was live.
    pub fn retire(&mut self, pos: VoxelPos) -> Option<LightSource> {
        let id = self.by_pos.remove(&pos)?;
        self.slots.get_mut(id.0 as usize)?.take()
    }

    pub fn get(&self, id: LightSourceId) -> Option<&LightSource> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    /// The live source at `pos`, if any.
    pub fn at(&self, pos: VoxelPos) -> Option<&LightSource> {
        self.by_pos.get(&pos).and_then(|id| self.get(*id))
    }

    /// Live sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LightSource> {
        self.slots.iter().flatten()
    }

    /// Number of live sources.
    pub fn len(&self) -> usize {
        self.by_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pos.is_empty()
    }

    /// Number of tombstoned slots awaiting compaction.
    pub fn tombstones(&self) -> usize {
        self.slots.len() - self.by_pos.len()
    }

    /// Drops tombstones and renumbers the live sources.
    ///
    /// Invalidates every previously issued [`LightSourceId`].
    pub fn compact(&mut self) {
        if self.tombstones() == 0 {
            return;
        }
        self.slots.retain(Option::is_some);
        self.by_pos.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(source) = slot {
                self.by_pos.insert(source.pos, LightSourceId(i as u32));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> Luminosity {
        Luminosity {
            value: 16.0,
            face: Face::PosZ,
            self_luminosity: 4.0,
        }
    }

    #[test]
    fn test_inert_descriptor_is_discarded() {
        let mut index = LightSourceIndex::new();
        assert!(index.register(VoxelPos::new(0, 0, 0), Luminosity::NONE).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_retire_leaves_tombstone_until_compact() {
        let mut index = LightSourceIndex::new();
        let a = VoxelPos::new(0, 0, 0);
        let b = VoxelPos::new(3, 1, 2);
        index.register(a, lamp());
        index.register(b, lamp());

        let retired = index.retire(a).unwrap();
        assert_eq!(retired.pos, a);
        assert_eq!(index.len(), 1);
        assert_eq!(index.tombstones(), 1);

        index.compact();
        assert_eq!(index.tombstones(), 0);
        assert_eq!(index.at(b).map(|s| s.pos), Some(b));
        assert_eq!(index.get(LightSourceId(0)).map(|s| s.pos), Some(b));
    }

    #[test]
    fn test_reregister_same_position_replaces() {
        let mut index = LightSourceIndex::new();
        let pos = VoxelPos::new(1, 1, 1);
        index.register(pos, lamp());
        let mut dim = lamp();
        dim.value = 2.0;
        index.register(pos, dim);
        assert_eq!(index.len(), 1);
        assert_eq!(index.iter().count(), 1);
        assert_eq!(index.at(pos).unwrap().luminosity, 2.0);
    }
}
