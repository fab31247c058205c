//! Write-behind chunk persistence.
//!
//! [`WriteBehindStorage`] hands each record to a single writer thread and
//! returns at once, so periodic saves never wait on the disk. Records stay
//! readable from memory until the backend has them. Dropping the storage
//! drains the queue before the thread exits.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use rustc_hash::FxHashMap;

use isovox_voxel::ChunkCoord;

use crate::error::WorldError;
use crate::storage::ChunkStorage;

type Pending = FxHashMap<ChunkCoord, Vec<u8>>;

enum WriteCommand {
    Save { coord: ChunkCoord, record: Vec<u8> },
    /// Answered with the number of failed writes since the last flush.
    Flush(Sender<usize>),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wraps a blocking [`ChunkStorage`] with a background writer.
pub struct WriteBehindStorage<S> {
    backend: Arc<Mutex<S>>,
    pending: Arc<Mutex<Pending>>,
    sender: Option<Sender<WriteCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl<S: ChunkStorage + Send + 'static> WriteBehindStorage<S> {
    pub fn new(backend: S) -> Self {
        let backend = Arc::new(Mutex::new(backend));
        let pending = Arc::new(Mutex::new(Pending::default()));
        let (sender, receiver) = crossbeam_channel::unbounded();

        let handle = std::thread::spawn({
            let backend = Arc::clone(&backend);
            let pending = Arc::clone(&pending);
            move || run_writer(&receiver, &backend, &pending)
        });

        Self {
            backend,
            pending,
            sender: Some(sender),
            handle: Some(handle),
        }
    }
}

impl<S> WriteBehindStorage<S> {
    /// Records queued or failed that the backend does not hold yet.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Stops accepting records, writes everything already queued, and joins
    /// the writer thread.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Chunk writer panicked");
            }
        }
    }

    fn sender(&self) -> Result<&Sender<WriteCommand>, WorldError> {
        self.sender.as_ref().ok_or(WorldError::WriterStopped)
    }
}

impl<S: ChunkStorage> ChunkStorage for WriteBehindStorage<S> {
    fn load(&self, coord: ChunkCoord) -> Result<Option<Vec<u8>>, WorldError> {
        let queued = lock(&self.pending).get(&coord).cloned();
        if queued.is_some() {
            return Ok(queued);
        }
        lock(&self.backend).load(coord)
    }

    fn save(&mut self, coord: ChunkCoord, record: &[u8]) -> Result<(), WorldError> {
        let sender = self.sender()?;
        lock(&self.pending).insert(coord, record.to_vec());
        sender
            .send(WriteCommand::Save {
                coord,
                record: record.to_vec(),
            })
            .map_err(|_| WorldError::WriterStopped)
    }

    /// Blocks until every record queued so far has been handed to the
    /// backend, then flushes the backend.
    fn flush(&mut self) -> Result<(), WorldError> {
        let (reply, done) = crossbeam_channel::bounded(1);
        self.sender()?
            .send(WriteCommand::Flush(reply))
            .map_err(|_| WorldError::WriterStopped)?;
        let failed = done.recv().map_err(|_| WorldError::WriterStopped)?;
        if failed > 0 {
            return Err(WorldError::WriteFailed(failed));
        }
        lock(&self.backend).flush()
    }
}

impl<S> Drop for WriteBehindStorage<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_writer<S: ChunkStorage>(
    receiver: &Receiver<WriteCommand>,
    backend: &Mutex<S>,
    pending: &Mutex<Pending>,
) {
    let mut failed = 0;
    while let Ok(command) = receiver.recv() {
        match command {
            WriteCommand::Save { coord, record } => {
                let result = lock(backend).save(coord, &record);
                match result {
                    Ok(()) => {
                        let mut pending = lock(pending);
                        // A newer record for the same chunk may be queued.
                        if pending.get(&coord) == Some(&record) {
                            pending.remove(&coord);
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::warn!("Failed to write chunk {coord:?}: {e}");
                    }
                }
            }
            WriteCommand::Flush(reply) => {
                // The flusher may have given up waiting.
                let _ = reply.send(std::mem::take(&mut failed));
            }
        }
    }
    tracing::debug!("Chunk writer stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DirChunkStorage, MemoryChunkStorage, record_name};

    /// Backend whose writes always fail.
    struct ReadOnlyStorage;

    impl ChunkStorage for ReadOnlyStorage {
        fn load(&self, _coord: ChunkCoord) -> Result<Option<Vec<u8>>, WorldError> {
            Ok(None)
        }

        fn save(&mut self, _coord: ChunkCoord, _record: &[u8]) -> Result<(), WorldError> {
            Err(std::io::Error::other("read-only").into())
        }
    }

    #[test]
    fn test_flush_writes_queued_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = WriteBehindStorage::new(DirChunkStorage::new(dir.path()));
        for cx in 0..8 {
            storage.save(ChunkCoord::new(cx, 0), &[cx as u8; 4]).unwrap();
        }
        storage.flush().unwrap();

        assert_eq!(storage.pending(), 0);
        for cx in 0..8 {
            let path = dir.path().join(record_name(ChunkCoord::new(cx, 0)));
            assert_eq!(std::fs::read(path).unwrap(), vec![cx as u8; 4]);
        }
    }

    #[test]
    fn test_load_sees_unwritten_record() {
        let mut storage = WriteBehindStorage::new(MemoryChunkStorage::new());
        let coord = ChunkCoord::new(-2, 5);
        assert_eq!(storage.load(coord).unwrap(), None);

        storage.save(coord, &[1, 2, 3]).unwrap();
        storage.save(coord, &[4, 5]).unwrap();
        assert_eq!(storage.load(coord).unwrap(), Some(vec![4, 5]));
        storage.flush().unwrap();
        assert_eq!(storage.load(coord).unwrap(), Some(vec![4, 5]));
    }

    #[test]
    fn test_drop_drains_queue() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut storage = WriteBehindStorage::new(DirChunkStorage::new(dir.path()));
            for cy in 0..16 {
                storage.save(ChunkCoord::new(1, cy), &[7; 32]).unwrap();
            }
        }
        for cy in 0..16 {
            assert!(dir.path().join(record_name(ChunkCoord::new(1, cy))).exists());
        }
    }

    #[test]
    fn test_failed_writes_surface_on_flush() {
        let mut storage = WriteBehindStorage::new(ReadOnlyStorage);
        let coord = ChunkCoord::new(0, 0);
        storage.save(coord, &[9]).unwrap();
        storage.save(ChunkCoord::new(1, 0), &[9]).unwrap();

        assert!(matches!(storage.flush(), Err(WorldError::WriteFailed(2))));
        // The record is kept in memory and the failure count resets.
        assert_eq!(storage.load(coord).unwrap(), Some(vec![9]));
        assert_eq!(storage.pending(), 2);
        assert!(storage.flush().is_ok());
    }

    #[test]
    fn test_save_after_shutdown_is_rejected() {
        let mut storage = WriteBehindStorage::new(MemoryChunkStorage::new());
        storage.shutdown();
        assert!(matches!(
            storage.save(ChunkCoord::new(0, 0), &[1]),
            Err(WorldError::WriterStopped)
        ));
        assert!(matches!(storage.flush(), Err(WorldError::WriterStopped)));
    }
}
