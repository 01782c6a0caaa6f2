use super::Snapshot;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// Source of remote state for one unit.
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Latest known snapshot. Never blocks.
    fn snapshot(&self) -> Snapshot;

    /// Resolve once the remote state has changed since the last wakeup.
    ///
    /// Changes raised while nobody is waiting collapse into one pending
    /// wakeup.
    async fn changed(&self);
}

/// In-process watcher fed by whatever transport delivers remote state.
///
/// Readers never block; publishers are serialised so versions are stamped
/// in the order snapshots become visible.
pub struct SnapshotWatcher {
    current: ArcSwap<Snapshot>,
    changed: Notify,
    publish_lock: Mutex<()>,
}

impl SnapshotWatcher {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            changed: Notify::new(),
            publish_lock: Mutex::new(()),
        }
    }

    /// Publish a new desired state, returning the version it was stamped with.
    pub fn publish(&self, snapshot: Snapshot) -> u64 {
        self.update(|next| *next = snapshot)
    }

    /// Derive the next snapshot from the current one and publish it.
    pub fn update(&self, mutate: impl FnOnce(&mut Snapshot)) -> u64 {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = self.current.load_full();
        let mut next = (*previous).clone();
        mutate(&mut next);
        next.version = previous.version + 1;
        next.observed_at = Utc::now();

        let version = next.version;
        self.current.store(Arc::new(next));
        self.changed.notify_one();
        tracing::trace!(version, "remote state published");
        version
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }
}

impl Default for SnapshotWatcher {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

#[async_trait]
impl Watcher for SnapshotWatcher {
    fn snapshot(&self) -> Snapshot {
        (**self.current.load()).clone()
    }

    async fn changed(&self) {
        self.changed.notified().await;
    }
}
