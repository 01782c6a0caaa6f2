use super::traits::{LoopEvent, Observer};
use tracing::{debug, info, warn};

/// Writes loop events as structured `tracing` lines tagged with the unit.
pub struct LogObserver {
    unit: String,
}

impl LogObserver {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &LoopEvent) {
        let unit = self.unit.as_str();
        match event {
            LoopEvent::OperationStarted { op } => {
                info!(unit, op = %op, "operation.start");
            }
            LoopEvent::OperationCompleted { op, duration } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                info!(unit, op = %op, duration_ms = ms, "operation.end");
            }
            LoopEvent::OperationFailed { op, error } => {
                warn!(unit, op = %op, error = %error, "operation.failed");
            }
            LoopEvent::CharmDir { available } => {
                debug!(unit, available, "charmdir");
            }
            LoopEvent::RemoteStateChanged { version } => {
                debug!(unit, version, "remotestate.changed");
            }
            LoopEvent::Idle => {
                info!(unit, "resolver.idle");
            }
            LoopEvent::Waiting => {
                debug!(unit, "resolver.waiting");
            }
            LoopEvent::Aborted => {
                info!(unit, "resolver.aborted");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
