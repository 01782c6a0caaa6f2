pub mod log;
pub mod noop;
pub mod traits;

pub use self::log::LogObserver;
pub use noop::NoopObserver;
pub use traits::{LoopEvent, Observer};

use crate::config::{LoggingConfig, ObservabilityConfig};
use tracing::Level;

/// Factory: create the right observer from config
pub fn create_observer(config: &ObservabilityConfig, unit: &str) -> Box<dyn Observer> {
    match config.backend.as_str() {
        "log" => Box::new(LogObserver::new(unit)),
        "none" | "noop" => Box::new(NoopObserver),
        _ => {
            tracing::warn!(
                "Unknown observability backend '{}', falling back to noop",
                config.backend
            );
            Box::new(NoopObserver)
        }
    }
}

/// Install a global fmt subscriber at the configured level.
///
/// Returns `false` when a global subscriber was already installed, which is
/// the normal case when the embedding process set up its own logging.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let level = parse_level(&config.level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(config.ansi)
        .try_init()
        .is_ok()
}

fn parse_level(level: &str) -> Option<Level> {
    match level {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
