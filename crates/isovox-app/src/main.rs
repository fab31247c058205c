//! The isovox binary: loads configuration, starts logging, and runs the world
//! headlessly for a fixed number of frames before saving.

use std::sync::Arc;

use clap::Parser;
use isovox_app::{AppError, FIXED_DT, GameLoop, HeadlessRenderer, IsoApp, palette};
use isovox_config::{CliArgs, Config, default_config_dir};
use isovox_voxel::VoxelTypeRegistry;
use isovox_world::{DirChunkStorage, WriteBehindStorage};
use tracing::{error, info};

/// Frames run when `--frames` is not given: ten seconds of simulation.
const DEFAULT_FRAMES: u64 = 600;

fn main() {
    let args = CliArgs::parse();

    let Some(config_dir) = args.config.clone().or_else(default_config_dir) else {
        eprintln!("No config directory available; pass --config");
        std::process::exit(1);
    };
    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    isovox_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    if let Err(e) = run(&config, args.frames.unwrap_or(DEFAULT_FRAMES)) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &Config, frames: u64) -> Result<(), AppError> {
    let registry = Arc::new(VoxelTypeRegistry::from_ron(palette::DEFAULT_VOXELS)?);
    let world_dir = config.world.world_dir().ok_or(AppError::NoDataDir)?;
    info!("Saving chunks under {}", world_dir.display());

    let storage = WriteBehindStorage::new(DirChunkStorage::new(world_dir));
    let mut app = IsoApp::new(config, registry, Box::new(storage))?;
    let mut renderer = HeadlessRenderer::default();
    let mut game_loop = GameLoop::new();

    for _ in 0..frames {
        game_loop.advance(
            FIXED_DT,
            &mut app,
            |app, dt| app.update(dt as f32),
            |app, _alpha| {
                app.render(&mut renderer);
            },
        )?;
    }

    let saved = app.save()?;
    info!(
        frames = game_loop.frame_count(),
        updates = game_loop.update_count(),
        draw_commands = renderer.commands,
        chunks = app.world().store().chunk_count(),
        saved,
        "Headless run finished"
    );
    Ok(())
}
