//! Background visibility sorting over owned store snapshots.

use std::sync::Arc;
use std::thread::JoinHandle;

use isovox_voxel::{VoxelStore, VoxelTypeRegistry};

use crate::camera::IsoCamera;
use crate::projection::Projection;
use crate::visibility::{VisibleVoxel, sort_visible};

/// A sort job. The snapshot is owned, so the live store keeps mutating
/// while the worker runs.
struct SortRequest {
    generation: u64,
    snapshot: VoxelStore,
    camera: IsoCamera,
}

/// A finished sort, tagged with the generation of the request it answers.
#[derive(Debug)]
pub struct SortResult {
    pub generation: u64,
    pub camera: IsoCamera,
    pub visible: Vec<VisibleVoxel>,
}

/// Single worker thread that sorts the most recent request.
///
/// Requests queued behind a newer one are skipped, and results older than
/// the newest one already delivered are dropped.
pub struct SortWorker {
    request_sender: Option<crossbeam_channel::Sender<SortRequest>>,
    result_receiver: crossbeam_channel::Receiver<SortResult>,
    handle: Option<JoinHandle<()>>,
    render_distance: u32,
    next_generation: u64,
    delivered: u64,
}

impl SortWorker {
    pub fn new(
        registry: Arc<VoxelTypeRegistry>,
        projection: Projection,
        render_distance: u32,
    ) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<SortRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let handle = std::thread::spawn(move || {
            while let Ok(mut request) = request_rx.recv() {
                while let Ok(newer) = request_rx.try_recv() {
                    request = newer;
                }
                let visible = sort_visible(
                    &request.snapshot,
                    &registry,
                    &request.camera,
                    &projection,
                    render_distance,
                );
                if result_tx
                    .send(SortResult {
                        generation: request.generation,
                        camera: request.camera,
                        visible,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });

        Self {
            request_sender: Some(request_tx),
            result_receiver: result_rx,
            handle: Some(handle),
            render_distance,
            next_generation: 1,
            delivered: 0,
        }
    }

    /// Snapshots the region around the camera and queues a sort. Returns the
    /// request's generation, or `None` once the worker has shut down.
    pub fn submit(&mut self, store: &VoxelStore, camera: &IsoCamera) -> Option<u64> {
        let sender = self.request_sender.as_ref()?;
        // One extra ring so occlusion checks at the edge see their neighbours.
        let center = camera.chunk(store.shift());
        let snapshot = store.region_snapshot(center, self.render_distance + 1);
        let generation = self.next_generation;
        sender
            .send(SortRequest {
                generation,
                snapshot,
                camera: *camera,
            })
            .ok()?;
        self.next_generation += 1;
        Some(generation)
    }

    /// The newest finished sort not yet delivered, if any.
    pub fn latest(&mut self) -> Option<SortResult> {
        let newest = self
            .result_receiver
            .try_iter()
            .filter(|r| r.generation > self.delivered)
            .max_by_key(|r| r.generation)?;
        self.delivered = newest.generation;
        Some(newest)
    }

    /// Generation of the last result handed out by [`latest`](Self::latest).
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn shutdown(&mut self) {
        self.request_sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Sort worker panicked");
            }
        }
    }
}

impl Drop for SortWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isovox_voxel::{FaceTextures, Luminosity, TileRef, VoxelPos, VoxelTypeDef};
    use std::time::{Duration, Instant};

    fn setup() -> (Arc<VoxelTypeRegistry>, VoxelStore) {
        let mut registry = VoxelTypeRegistry::new();
        let stone = registry
            .register(VoxelTypeDef {
                name: "stone".to_string(),
                solidness: 10,
                textures: vec![FaceTextures::Single(TileRef::new(2, 3))],
                ticks_per_frame: 0,
                luminosity: Luminosity::NONE,
            })
            .unwrap();
        let mut store = VoxelStore::default();
        for x in 0..4 {
            store.set(VoxelPos::new(x, 0, 0), stone, &registry);
        }
        (Arc::new(registry), store)
    }

    fn wait_for(worker: &mut SortWorker, generation: u64) -> SortResult {
        let start = Instant::now();
        loop {
            if let Some(result) = worker.latest() {
                if result.generation >= generation {
                    return result;
                }
            }
            assert!(start.elapsed().as_secs() < 5, "Timed out waiting for sort");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_worker_matches_inline_sort() {
        let (registry, store) = setup();
        let camera = IsoCamera::default();
        let projection = Projection::default();
        let expected = sort_visible(&store, &registry, &camera, &projection, 2);

        let mut worker = SortWorker::new(Arc::clone(&registry), projection, 2);
        let generation = worker.submit(&store, &camera).unwrap();
        let result = wait_for(&mut worker, generation);
        assert_eq!(result.generation, generation);
        assert_eq!(result.visible, expected);
    }

    #[test]
    fn test_stale_results_are_never_delivered() {
        let (registry, mut store) = setup();
        let mut worker = SortWorker::new(registry, Projection::default(), 2);
        let camera = IsoCamera::default();

        let first = worker.submit(&store, &camera).unwrap();
        store.delete(VoxelPos::new(0, 0, 0));
        let second = worker.submit(&store, &camera).unwrap();
        assert!(second > first);

        let result = wait_for(&mut worker, second);
        assert_eq!(result.visible.len(), 3, "sorted the edited snapshot");
        assert_eq!(worker.delivered(), second);
        std::thread::sleep(Duration::from_millis(20));
        assert!(worker.latest().is_none());
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let (registry, store) = setup();
        let mut worker = SortWorker::new(registry, Projection::default(), 1);
        worker.shutdown();
        assert_eq!(worker.submit(&store, &IsoCamera::default()), None);
    }
}
