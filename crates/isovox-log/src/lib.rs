//! Structured logging for isovox.
//!
//! Installs a `tracing` subscriber with an environment-aware filter, a
//! console layer timed from startup, and, in debug builds, a JSON log file
//! for post-mortem analysis.

use std::fs::File;
use std::path::Path;

use isovox_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets a level.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log written in debug builds.
pub const LOG_FILE_NAME: &str = "isovox.log";

/// Filter directives taken from the config's `debug.log_level`, falling back
/// to [`DEFAULT_FILTER`] when unset or empty.
pub fn filter_directives(config: Option<&Config>) -> String {
    config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// Creates `log_dir` and opens a fresh log file inside it.
pub fn open_log_file(log_dir: &Path) -> std::io::Result<File> {
    std::fs::create_dir_all(log_dir)?;
    File::create(log_dir.join(LOG_FILE_NAME))
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the config's `debug.log_level`. When
/// `debug_build` is set and `log_dir` is writable, a JSON file layer is added.
///
/// ```no_run
/// use isovox_config::Config;
/// use isovox_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && let Ok(log_file) = open_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(std::sync::Mutex::new(log_file))
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}
