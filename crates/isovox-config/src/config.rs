//! Configuration structs with defaults, RON persistence, and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use isovox_voxel::Face;

use crate::error::ConfigError;

/// Directory name used under the platform config and data directories.
pub const APP_NAME: &str = "isovox";

/// Platform config directory for the application, if the OS provides one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub world: WorldConfig,
    pub lighting: LightingConfig,
    pub render: RenderConfig,
    pub tasks: TaskConfig,
    pub debug: DebugConfig,
}

/// World identity and storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World name; chunk records are stored under `save_dir/name`.
    pub name: String,
    /// Terrain noise seed.
    pub seed: u32,
    /// log2 of the chunk edge length in voxels.
    pub chunk_shift: u32,
    /// Root directory for saved worlds. Defaults to the platform data
    /// directory when unset.
    pub save_dir: Option<PathBuf>,
    /// Extra structure templates (`"{id}.bin"` files) loaded at startup.
    /// Templates here replace built-in structures with the same id.
    pub structures_dir: Option<PathBuf>,
}

impl WorldConfig {
    /// Directory holding this world's chunk records.
    pub fn world_dir(&self) -> Option<PathBuf> {
        let root = self
            .save_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_NAME).join("worlds")))?;
        Some(root.join(&self.name))
    }
}

/// The directional emitter that seeds skylight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SunConfig {
    pub luminosity: f32,
    pub self_luminosity: f32,
    pub face: Face,
}

/// Light propagation and clamping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    /// Light values at or above this draw at full brightness.
    pub max_light: f32,
    /// Floor applied to every face before drawing.
    pub min_light: f32,
    /// Cost of a propagation step that turns away from the travel direction.
    pub attenuation: f32,
    pub sun: SunConfig,
}

/// Isometric view settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Render distance in chunks.
    pub render_distance: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    /// Height of a tile's top rim in pixels.
    pub layer_offset: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Diagonal distance at which fog is total.
    pub fog_scale: f32,
    /// Camera easing rate per second.
    pub camera_speed: f32,
    /// Sort visibility on a worker thread instead of inline.
    pub sort_on_worker: bool,
}

/// Background task pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskConfig {
    /// Chunk lifecycle ticks per second.
    pub tasks_per_second: f32,
    /// Chunks lit per lifecycle tick.
    pub chunks_per_task: u32,
    /// Chunks loaded or generated per lifecycle tick.
    pub loads_per_tick: u32,
    /// Maximum edit rate.
    pub voxels_placed_per_second: f32,
    /// Texture animation ticks per second.
    pub animation_ticks_per_second: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log per-frame timing and draw counts.
    pub diagnostics: bool,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_string(),
            seed: 0,
            chunk_shift: 4,
            save_dir: None,
            structures_dir: None,
        }
    }
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            luminosity: 4.0,
            self_luminosity: 4.0,
            face: Face::NegZ,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            max_light: 16.0,
            min_light: 3.0,
            attenuation: 2.0,
            sun: SunConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_distance: 7,
            tile_width: 16.0,
            tile_height: 16.0,
            layer_offset: 4.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            fog_scale: 200.0,
            camera_speed: 4.0,
            sort_on_worker: true,
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            tasks_per_second: 5.0,
            chunks_per_task: 1,
            loads_per_tick: 64,
            voxels_placed_per_second: 10.0,
            animation_ticks_per_second: 10.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            diagnostics: false,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Rejects settings the world cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }
        fn nonzero(field: &'static str, value: u32) -> Result<(), ConfigError> {
            if value == 0 {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                })
            } else {
                Ok(())
            }
        }

        if !(1..=16).contains(&self.world.chunk_shift) {
            return Err(ConfigError::Invalid {
                field: "world.chunk_shift",
                reason: format!("must be in 1..=16, got {}", self.world.chunk_shift),
            });
        }

        let lighting = &self.lighting;
        positive("lighting.attenuation", lighting.attenuation)?;
        positive("lighting.max_light", lighting.max_light)?;
        if !lighting.min_light.is_finite() || lighting.min_light > lighting.max_light {
            return Err(ConfigError::Invalid {
                field: "lighting.min_light",
                reason: format!(
                    "{} exceeds max_light {}",
                    lighting.min_light, lighting.max_light
                ),
            });
        }
        if !lighting.sun.luminosity.is_finite() || lighting.sun.luminosity < 0.0 {
            return Err(ConfigError::Invalid {
                field: "lighting.sun.luminosity",
                reason: format!("must be non-negative, got {}", lighting.sun.luminosity),
            });
        }

        let render = &self.render;
        nonzero("render.render_distance", render.render_distance)?;
        positive("render.tile_width", render.tile_width)?;
        positive("render.tile_height", render.tile_height)?;
        positive("render.viewport_width", render.viewport_width)?;
        positive("render.viewport_height", render.viewport_height)?;
        positive("render.fog_scale", render.fog_scale)?;
        positive("render.camera_speed", render.camera_speed)?;

        let tasks = &self.tasks;
        positive("tasks.tasks_per_second", tasks.tasks_per_second)?;
        positive("tasks.voxels_placed_per_second", tasks.voxels_placed_per_second)?;
        positive("tasks.animation_ticks_per_second", tasks.animation_ticks_per_second)?;
        nonzero("tasks.chunks_per_task", tasks.chunks_per_task)?;
        nonzero("tasks.loads_per_tick", tasks.loads_per_tick)?;
        Ok(())
    }
}
