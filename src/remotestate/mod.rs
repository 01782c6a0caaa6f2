//! Remote (desired) state as seen by the unit agent.
//!
//! A [`Watcher`] hands out point-in-time [`Snapshot`]s plus a coalescing
//! change signal. While an operation runs, the resolver loop forwards fresh
//! snapshots into the executor through a single-slot [`mailbox`].

pub mod mailbox;
pub mod snapshot;
pub mod watcher;

pub use mailbox::{SnapshotReceiver, SnapshotSender, snapshot_mailbox};
pub use snapshot::{Life, RelationSnapshot, Snapshot};
pub use watcher::{SnapshotWatcher, Watcher};
