use super::traits::{LoopEvent, Observer};

/// Discards every event.
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn record_event(&self, _event: &LoopEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}
