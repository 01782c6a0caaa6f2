mod core;
mod observability;

pub use self::core::UniterConfig;
pub use observability::{LoggingConfig, ObservabilityConfig};
