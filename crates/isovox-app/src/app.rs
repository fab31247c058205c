//! The application driver: owns the world and advances every subsystem on
//! its own cadence from a single `update(dt)`.

use std::sync::Arc;

use glam::Vec2;
use isovox_config::Config;
use isovox_lighting::{PropagationParams, Sun};
use isovox_render::{
    DrawCommand, DrawList, DrawParams, IsoCamera, PickHit, Projection, Renderer, SortWorker,
    VisibleVoxel, pick, reproject, sort_visible,
};
use isovox_voxel::{VoxelTypeId, VoxelTypeRegistry};
use isovox_world::{
    ChunkLifecycle, ChunkStorage, EditEngine, EditOutcome, EditRequest, LifecycleConfig,
    StructureLibrary, World, save_chunks,
};
use tracing::{debug, info};

use crate::error::AppError;
use crate::palette::{TerrainPalette, default_structures};
use crate::terrain::{HeightmapParams, HeightmapTerrain};

/// Where the visibility sort runs.
enum Sorter {
    Inline,
    Worker(SortWorker),
}

/// Renderer that only counts what it is given.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub commands: u64,
}

impl Renderer for HeadlessRenderer {
    fn submit(&mut self, commands: &[DrawCommand]) {
        self.frames += 1;
        self.commands += commands.len() as u64;
    }
}

/// Fires once every `interval` seconds of accumulated time.
#[derive(Debug)]
struct Cadence {
    interval: f32,
    elapsed: f32,
}

impl Cadence {
    fn per_second(rate: f32) -> Self {
        Self {
            interval: 1.0 / rate,
            elapsed: 0.0,
        }
    }

    /// Adds `dt` and reports whether an interval completed. At most one
    /// firing per call; surplus time carries over.
    fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = (self.elapsed - self.interval).min(self.interval);
        true
    }
}

pub struct IsoApp {
    world: World,
    lifecycle: ChunkLifecycle,
    edits: EditEngine,
    terrain: HeightmapTerrain,
    storage: Box<dyn ChunkStorage>,
    camera: IsoCamera,
    projection: Projection,
    draw_params: DrawParams,
    render_distance: u32,
    sorter: Sorter,
    visible: Vec<VisibleVoxel>,
    needs_sort: bool,
    tasks: Cadence,
    animation: Cadence,
    animation_tick: u64,
    diagnostics: bool,
}

impl IsoApp {
    pub fn new(
        config: &Config,
        registry: Arc<VoxelTypeRegistry>,
        storage: Box<dyn ChunkStorage>,
    ) -> Result<Self, AppError> {
        let lighting = &config.lighting;
        let params = PropagationParams::new(lighting.attenuation)?;
        let sun = Sun {
            luminosity: lighting.sun.luminosity,
            self_luminosity: lighting.sun.self_luminosity,
            face: lighting.sun.face,
        };

        let palette = TerrainPalette::from_registry(&registry)?;
        let mut structures = default_structures(&palette);
        if let Some(dir) = &config.world.structures_dir {
            structures.merge(StructureLibrary::load_dir(dir, &registry)?);
        }
        let world = World::new(Arc::clone(&registry), config.world.chunk_shift, params, sun)
            .with_structures(structures);
        let terrain = HeightmapTerrain::new(
            HeightmapParams {
                seed: config.world.seed,
                ..HeightmapParams::default()
            },
            palette,
        );

        let render = &config.render;
        let projection = Projection {
            tile_width: render.tile_width,
            tile_height: render.tile_height,
            layer_offset: render.layer_offset,
            viewport_width: render.viewport_width,
            viewport_height: render.viewport_height,
        };
        let sorter = if render.sort_on_worker {
            Sorter::Worker(SortWorker::new(registry, projection, render.render_distance))
        } else {
            Sorter::Inline
        };

        let tasks = &config.tasks;
        info!(
            "World '{}' (seed {}), render distance {}",
            config.world.name, config.world.seed, render.render_distance
        );
        Ok(Self {
            world,
            lifecycle: ChunkLifecycle::new(LifecycleConfig {
                render_distance: render.render_distance,
                loads_per_tick: tasks.loads_per_tick,
                chunks_per_task: tasks.chunks_per_task,
            }),
            edits: EditEngine::new(tasks.voxels_placed_per_second),
            terrain,
            storage,
            camera: IsoCamera::new(Vec2::ZERO, render.camera_speed),
            projection,
            draw_params: DrawParams {
                min_light: lighting.min_light,
                max_light: lighting.max_light,
                fog_scale: render.fog_scale,
            },
            render_distance: render.render_distance,
            sorter,
            visible: Vec::new(),
            needs_sort: true,
            tasks: Cadence::per_second(tasks.tasks_per_second),
            animation: Cadence::per_second(tasks.animation_ticks_per_second),
            animation_tick: 0,
            diagnostics: config.debug.diagnostics,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &IsoCamera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// The current draw-ordered visible list.
    pub fn visible(&self) -> &[VisibleVoxel] {
        &self.visible
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// The camera eases every call; pending edits go through the edit
    /// throttle; chunk work runs at the task rate and texture animation at the
    /// animation rate, which also hands dirty chunks to storage without
    /// waiting for them to be written.
    pub fn update(&mut self, dt: f32) -> Result<(), AppError> {
        self.camera.ease(dt);

        match self.edits.tick(dt, &mut self.world)? {
            EditOutcome::Applied { request, chunk } => {
                debug!("Applied edit at {:?} in chunk {chunk:?}", request.pos);
                self.needs_sort = true;
            }
            EditOutcome::Dropped(_) | EditOutcome::Idle => {}
        }

        if self.tasks.advance(dt) {
            let shift = self.world.store().shift();
            let result = self.lifecycle.tick(
                self.camera.destination_chunk(shift),
                &mut self.world,
                &self.terrain,
                &*self.storage,
            )?;
            if !result.lit.is_empty() {
                self.needs_sort = true;
            }
            if self.diagnostics {
                debug!(
                    requested = result.requested,
                    loaded = result.loaded,
                    generated = result.generated,
                    lit = result.lit.len(),
                    queued = self.lifecycle.load_queue().len(),
                    "Task tick"
                );
            }
        }

        if self.animation.advance(dt) {
            self.animation_tick += 1;
            let positions: Vec<_> = self.visible.iter().map(|v| v.pos).collect();
            self.world.animate(self.animation_tick, &positions);
            self.autosave()?;
        }

        if self.needs_sort {
            self.needs_sort = false;
            self.request_sort();
        }
        if let Sorter::Worker(worker) = &mut self.sorter {
            if let Some(result) = worker.latest() {
                self.visible = result.visible;
            }
        }
        Ok(())
    }

    fn request_sort(&mut self) {
        match &mut self.sorter {
            Sorter::Inline => {
                self.visible = sort_visible(
                    self.world.store(),
                    self.world.registry(),
                    &self.camera,
                    &self.projection,
                    self.render_distance,
                );
            }
            Sorter::Worker(worker) => {
                if worker.submit(self.world.store(), &self.camera).is_none() {
                    tracing::warn!("Sort worker is gone; sorting inline");
                    self.sorter = Sorter::Inline;
                    self.request_sort();
                }
            }
        }
    }

    /// Reprojects the visible list for the eased camera and submits a frame.
    /// Returns the number of draw commands.
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> usize {
        reproject(&mut self.visible, &self.camera, &self.projection);
        let list = DrawList::build(
            &self.visible,
            self.world.store(),
            self.world.field(),
            self.world.registry(),
            &self.camera,
            &self.projection,
            &self.draw_params,
        );
        list.submit(renderer);
        list.len()
    }

    pub fn pick(&self, point: Vec2) -> Option<PickHit> {
        pick(&self.visible, &self.projection, point)
    }

    /// Queues `request` behind the edit throttle.
    pub fn request_edit(&mut self, request: EditRequest) {
        self.edits.request(request);
    }

    /// Places `voxel` against the face under `point`.
    pub fn place_at(&mut self, point: Vec2, voxel: VoxelTypeId) -> Option<PickHit> {
        let hit = self.pick(point)?;
        self.request_edit(EditRequest::place(hit.placement_target(&self.camera), voxel));
        Some(hit)
    }

    /// Removes the voxel under `point`.
    pub fn destroy_at(&mut self, point: Vec2) -> Option<PickHit> {
        let hit = self.pick(point)?;
        self.request_edit(EditRequest::remove(hit.pos));
        Some(hit)
    }

    /// Starts easing the camera towards the column under `point`.
    pub fn move_to(&mut self, point: Vec2) -> Option<PickHit> {
        let hit = self.pick(point)?;
        self.camera.move_to(Vec2::new(hit.pos.x as f32, hit.pos.y as f32));
        self.needs_sort = true;
        Some(hit)
    }

    pub fn rotate_left(&mut self) {
        self.camera.rotate_left();
        self.needs_sort = true;
    }

    pub fn rotate_right(&mut self) {
        self.camera.rotate_right();
        self.needs_sort = true;
    }

    pub fn flip(&mut self) {
        self.camera.flip();
        self.needs_sort = true;
    }

    /// Hands every dirty chunk to storage. Write-behind backends return
    /// before the records reach disk.
    fn autosave(&mut self) -> Result<usize, AppError> {
        let saved = save_chunks(&mut self.world, &mut *self.storage)?;
        if saved > 0 {
            debug!("Queued {saved} chunks for saving");
        }
        Ok(saved)
    }

    /// Saves every dirty chunk and waits until storage has persisted all
    /// records queued so far.
    pub fn save(&mut self) -> Result<usize, AppError> {
        let saved = self.autosave()?;
        self.storage.flush()?;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::DEFAULT_VOXELS;
    use isovox_voxel::{Axis, ChunkCoord, VoxelPos, chunk_serial};
    use isovox_world::{
        ChunkLoadState, DirChunkStorage, MemoryChunkStorage, StructureId, WorldError,
        WriteBehindStorage, record_name,
    };
    use std::sync::Mutex;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> Config {
        let mut config = Config::default();
        config.render.render_distance = 2;
        config.render.sort_on_worker = false;
        config.tasks.tasks_per_second = 60.0;
        config.tasks.chunks_per_task = 9;
        config
    }

    fn app_with(config: &Config, storage: Box<dyn ChunkStorage>) -> IsoApp {
        let registry = Arc::new(VoxelTypeRegistry::from_ron(DEFAULT_VOXELS).unwrap());
        IsoApp::new(config, registry, storage).unwrap()
    }

    fn run_until_lit(app: &mut IsoApp) {
        for _ in 0..600 {
            app.update(DT).unwrap();
            if app.world().states().get(ChunkCoord::new(0, 0)).is_lit() && !app.visible().is_empty() {
                return;
            }
        }
        panic!("centre chunk never lit");
    }

    fn top_of(app: &IsoApp, x: i32, y: i32) -> i32 {
        app.world()
            .store()
            .column(x, y)
            .last()
            .map(|(z, _)| z)
            .unwrap()
    }

    #[test]
    fn test_startup_lights_and_renders() {
        let mut app = app_with(&config(), Box::new(MemoryChunkStorage::new()));
        run_until_lit(&mut app);

        let mut renderer = HeadlessRenderer::default();
        let drawn = app.render(&mut renderer);
        assert!(drawn > 0);
        assert_eq!(renderer.frames, 1);
        assert_eq!(renderer.commands, drawn as u64);
    }

    #[test]
    fn test_pick_hits_front_voxel_top() {
        let mut app = app_with(&config(), Box::new(MemoryChunkStorage::new()));
        run_until_lit(&mut app);
        app.render(&mut HeadlessRenderer::default());

        let front = *app.visible().last().unwrap();
        let p = app.projection();
        let point = front.screen.as_vec2() + Vec2::new(p.tile_width / 2.0, p.layer_offset / 2.0);
        let hit = app.pick(point).unwrap();
        assert_eq!(hit.pos, front.pos);
        assert_eq!(hit.face, Axis::Z);
    }

    #[test]
    fn test_edit_is_applied_after_throttle() {
        let mut app = app_with(&config(), Box::new(MemoryChunkStorage::new()));
        run_until_lit(&mut app);

        let stone = app.world().registry().lookup_by_name("stone").unwrap();
        let target = VoxelPos::new(3, 3, top_of(&app, 3, 3) + 1);
        app.request_edit(EditRequest::place(target, stone));
        for _ in 0..12 {
            app.update(DT).unwrap();
        }
        assert_eq!(app.world().store().get(target), Some(stone));
        assert!(app.world().states().get(ChunkCoord::new(0, 0)).is_lit());
    }

    #[test]
    fn test_rotation_resorts_visible_list() {
        let mut app = app_with(&config(), Box::new(MemoryChunkStorage::new()));
        run_until_lit(&mut app);
        let before: Vec<_> = app.visible().iter().map(|v| v.pos).collect();

        app.rotate_left();
        app.update(DT).unwrap();
        let after: Vec<_> = app.visible().iter().map(|v| v.pos).collect();
        assert_ne!(before, after);
        assert_eq!(app.camera().signs.x, 1);
        assert_eq!(app.camera().signs.y, -1);
    }

    #[test]
    fn test_edits_persist_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = config();
        let stone;
        let target;
        {
            let mut app = app_with(&config, Box::new(DirChunkStorage::new(dir.path())));
            run_until_lit(&mut app);
            stone = app.world().registry().lookup_by_name("stone").unwrap();
            target = VoxelPos::new(2, 5, top_of(&app, 2, 5) + 1);
            app.request_edit(EditRequest::place(target, stone));
            for _ in 0..12 {
                app.update(DT).unwrap();
            }
            app.save().unwrap();
            assert_eq!(app.world().states().get(ChunkCoord::new(0, 0)), ChunkLoadState::Lit);
            assert!(dir.path().join(record_name(ChunkCoord::new(0, 0))).exists());
        }

        let mut app = app_with(&config, Box::new(DirChunkStorage::new(dir.path())));
        run_until_lit(&mut app);
        assert_eq!(app.world().store().get(target), Some(stone));
    }

    #[test]
    fn test_structures_dir_extends_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let registry = VoxelTypeRegistry::from_ron(DEFAULT_VOXELS).unwrap();
        let stone = registry.lookup_by_name("stone").unwrap();
        let pillar: Vec<_> = (0..3).map(|z| (VoxelPos::new(16, 16, z), stone)).collect();
        std::fs::write(dir.path().join("7.bin"), chunk_serial::encode(pillar)).unwrap();

        let mut config = config();
        config.world.structures_dir = Some(dir.path().to_path_buf());
        let app = app_with(&config, Box::new(MemoryChunkStorage::new()));
        let structures = app.world().structures();
        assert_eq!(structures.len(), 2);
        assert!(structures.get(crate::palette::TREE).is_some());
        assert_eq!(structures.get(StructureId(7)).map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_missing_structures_dir_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.world.structures_dir = Some(dir.path().join("absent"));
        let registry = Arc::new(VoxelTypeRegistry::from_ron(DEFAULT_VOXELS).unwrap());
        let result = IsoApp::new(&config, registry, Box::new(MemoryChunkStorage::new()));
        assert!(matches!(result, Err(AppError::World(WorldError::Io(_)))));
    }

    /// Backend whose writes wait while the test holds `gate`.
    struct GatedStorage {
        gate: Arc<Mutex<()>>,
        written: Arc<Mutex<Vec<ChunkCoord>>>,
    }

    impl ChunkStorage for GatedStorage {
        fn load(&self, _coord: ChunkCoord) -> Result<Option<Vec<u8>>, WorldError> {
            Ok(None)
        }

        fn save(&mut self, coord: ChunkCoord, _record: &[u8]) -> Result<(), WorldError> {
            let _open = self.gate.lock().unwrap();
            self.written.lock().unwrap().push(coord);
            Ok(())
        }
    }

    #[test]
    fn test_autosave_does_not_wait_for_disk() {
        let gate = Arc::new(Mutex::new(()));
        let written = Arc::new(Mutex::new(Vec::new()));
        let storage = WriteBehindStorage::new(GatedStorage {
            gate: Arc::clone(&gate),
            written: Arc::clone(&written),
        });
        let mut app = app_with(&config(), Box::new(storage));
        run_until_lit(&mut app);
        assert!(app.lifecycle.load_queue().is_empty());

        let closed = gate.lock().unwrap();
        let stone = app.world().registry().lookup_by_name("stone").unwrap();
        let target = VoxelPos::new(6, 1, top_of(&app, 6, 1) + 1);
        app.request_edit(EditRequest::place(target, stone));
        // A full second covers the edit throttle and several autosaves.
        for _ in 0..60 {
            app.update(DT).unwrap();
        }
        assert_eq!(app.world().store().get(target), Some(stone));
        assert_eq!(app.world().states().get(ChunkCoord::new(0, 0)), ChunkLoadState::Lit);
        assert!(written.lock().unwrap().is_empty(), "autosave reached the disk early");

        drop(closed);
        app.save().unwrap();
        assert_eq!(*written.lock().unwrap(), vec![ChunkCoord::new(0, 0)]);
    }

    #[test]
    fn test_worker_sort_delivers_visible_list() {
        let mut config = config();
        config.render.sort_on_worker = true;
        let mut app = app_with(&config, Box::new(MemoryChunkStorage::new()));
        let start = std::time::Instant::now();
        while app.visible().is_empty() {
            app.update(DT).unwrap();
            assert!(start.elapsed().as_secs() < 10, "worker never delivered");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }
}
