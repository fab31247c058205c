//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// isovox command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "isovox", about = "Isometric voxel world")]
pub struct CliArgs {
    /// World name.
    #[arg(long)]
    pub world: Option<String>,

    /// Terrain seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Directory holding saved worlds.
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Directory of extra structure templates.
    #[arg(long)]
    pub structures_dir: Option<PathBuf>,

    /// Render distance in chunks.
    #[arg(long)]
    pub render_distance: Option<u32>,

    /// Chunks lit per lifecycle tick.
    #[arg(long)]
    pub chunks_per_task: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log per-frame diagnostics.
    #[arg(long)]
    pub diagnostics: bool,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run this many frames, save, and exit.
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref name) = args.world {
            self.world.name = name.clone();
        }
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(ref dir) = args.save_dir {
            self.world.save_dir = Some(dir.clone());
        }
        if let Some(ref dir) = args.structures_dir {
            self.world.structures_dir = Some(dir.clone());
        }
        if let Some(rd) = args.render_distance {
            self.render.render_distance = rd;
        }
        if let Some(n) = args.chunks_per_task {
            self.tasks.chunks_per_task = n;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if args.diagnostics {
            self.debug.diagnostics = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            world: Some("caves".to_string()),
            render_distance: Some(3),
            diagnostics: true,
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.name, "caves");
        assert_eq!(config.render.render_distance, 3);
        assert!(config.debug.diagnostics);
        // Non-overridden fields retain defaults
        assert_eq!(config.world.seed, 0);
        assert_eq!(config.tasks.chunks_per_task, 1);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "isovox",
            "--seed",
            "7",
            "--frames",
            "120",
            "--log-level",
            "debug",
            "--structures-dir",
            "/tmp/prefabs",
        ]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.frames, Some(120));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(!args.diagnostics);

        let mut config = Config::default();
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.structures_dir, Some(PathBuf::from("/tmp/prefabs")));
    }
}
