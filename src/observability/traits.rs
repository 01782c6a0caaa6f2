use std::time::Duration;

/// Events the resolver loop reports as it drives a unit.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    OperationStarted {
        op: String,
    },
    OperationCompleted {
        op: String,
        duration: Duration,
    },
    OperationFailed {
        op: String,
        error: String,
    },
    CharmDir {
        available: bool,
    },
    RemoteStateChanged {
        version: u64,
    },
    Idle,
    Waiting,
    Aborted,
}

/// Sink for loop events. Implementations must not block.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &LoopEvent);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
