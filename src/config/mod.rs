pub mod schema;

pub use schema::{LoggingConfig, ObservabilityConfig, UniterConfig};
