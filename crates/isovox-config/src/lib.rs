//! Configuration for the isovox world.
//!
//! Settings persist to disk as a RON file, accept CLI overrides via clap, and
//! are checked by [`Config::validate`] before the world starts.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    APP_NAME, Config, DebugConfig, LightingConfig, RenderConfig, SunConfig, TaskConfig,
    WorldConfig, default_config_dir,
};
pub use error::ConfigError;
