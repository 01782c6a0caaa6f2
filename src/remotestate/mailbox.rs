//! Capacity-one, latest-wins snapshot mailbox.
//!
//! Sending never blocks and overwrites any snapshot the receiver has not
//! taken yet, so a slow consumer only ever sees the newest value.

use super::Snapshot;
use tokio::sync::watch;

/// Create a connected sender/receiver pair with an empty slot.
pub fn snapshot_mailbox() -> (SnapshotSender, SnapshotReceiver) {
    let (tx, rx) = watch::channel(None);
    (SnapshotSender { slot: tx }, SnapshotReceiver { slot: rx })
}

#[derive(Debug)]
pub struct SnapshotSender {
    slot: watch::Sender<Option<Snapshot>>,
}

impl SnapshotSender {
    /// Replace the slot contents. Works whether or not the receiver is alive.
    pub fn send(&self, snapshot: Snapshot) {
        self.slot.send_replace(Some(snapshot));
    }
}

#[derive(Debug)]
pub struct SnapshotReceiver {
    slot: watch::Receiver<Option<Snapshot>>,
}

impl SnapshotReceiver {
    /// Wait for a snapshot newer than the last one taken.
    ///
    /// Returns `None` once the sender is gone and nothing is left to take.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        loop {
            self.slot.changed().await.ok()?;
            if let Some(snapshot) = self.slot.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    /// Take the pending snapshot, if any, without waiting. A snapshot sent
    /// before the sender was dropped is still delivered.
    pub fn try_recv(&mut self) -> Option<Snapshot> {
        let slot = self.slot.borrow_and_update();
        if !slot.has_changed() {
            return None;
        }
        (*slot).clone()
    }
}
