//! Logging setup for the demo host.

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Default level: debug in debug builds, info in release.
pub fn default_level() -> Level {
    if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `directive`, which
/// wins over [`default_level`].
pub fn init_logging(directive: Option<&str>) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| match directive {
            Some(d) => EnvFilter::try_new(d),
            None => EnvFilter::try_new(default_level().as_str()),
        })
        .map_err(|e| format!("Invalid log filter: {}", e))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set tracing subscriber: {}", e))
}
