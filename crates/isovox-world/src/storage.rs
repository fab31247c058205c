//! Persistence backends for encoded chunk records.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use isovox_voxel::ChunkCoord;

use crate::error::WorldError;

/// Stores one opaque record per chunk.
pub trait ChunkStorage {
    /// Returns the record for `coord`, or `None` if nothing was saved.
    fn load(&self, coord: ChunkCoord) -> Result<Option<Vec<u8>>, WorldError>;

    /// Replaces the record for `coord`. Backends may persist it later.
    fn save(&mut self, coord: ChunkCoord, record: &[u8]) -> Result<(), WorldError>;

    /// Blocks until every saved record is persisted.
    fn flush(&mut self) -> Result<(), WorldError> {
        Ok(())
    }
}

/// Record file name for a chunk: `"{cx},{cy}.bin"`.
pub fn record_name(coord: ChunkCoord) -> String {
    format!("{},{}.bin", coord.cx, coord.cy)
}

/// Keeps records in memory. Used by tests and throwaway worlds.
#[derive(Clone, Debug, Default)]
pub struct MemoryChunkStorage {
    records: FxHashMap<ChunkCoord, Vec<u8>>,
}

impl MemoryChunkStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts a raw record, bypassing encoding.
    pub fn insert_raw(&mut self, coord: ChunkCoord, record: Vec<u8>) {
        self.records.insert(coord, record);
    }
}

impl ChunkStorage for MemoryChunkStorage {
    fn load(&self, coord: ChunkCoord) -> Result<Option<Vec<u8>>, WorldError> {
        Ok(self.records.get(&coord).cloned())
    }

    fn save(&mut self, coord: ChunkCoord, record: &[u8]) -> Result<(), WorldError> {
        self.records.insert(coord, record.to_vec());
        Ok(())
    }
}

/// One file per chunk under a world directory.
#[derive(Clone, Debug)]
pub struct DirChunkStorage {
    root: PathBuf,
}

impl DirChunkStorage {
    /// Uses `root` as the world directory. It is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, coord: ChunkCoord) -> PathBuf {
        self.root.join(record_name(coord))
    }
}

impl ChunkStorage for DirChunkStorage {
    fn load(&self, coord: ChunkCoord) -> Result<Option<Vec<u8>>, WorldError> {
        match fs::read(self.path(coord)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, coord: ChunkCoord, record: &[u8]) -> Result<(), WorldError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path(coord), record)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name_format() {
        assert_eq!(record_name(ChunkCoord::new(-3, 12)), "-3,12.bin");
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let mut storage = MemoryChunkStorage::new();
        let coord = ChunkCoord::new(1, 1);
        assert_eq!(storage.load(coord).unwrap(), None);
        storage.save(coord, &[1, 2, 3]).unwrap();
        assert_eq!(storage.load(coord).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_dir_storage_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("worlds").join("test");
        let mut storage = DirChunkStorage::new(&root);
        let coord = ChunkCoord::new(0, -1);

        assert_eq!(storage.load(coord).unwrap(), None, "missing dir is a miss");
        storage.save(coord, &[0xAB; 16]).unwrap();
        assert!(root.join("0,-1.bin").exists());
        assert_eq!(storage.load(coord).unwrap(), Some(vec![0xAB; 16]));
    }
}
