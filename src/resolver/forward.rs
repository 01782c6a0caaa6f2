use crate::error::LoopError;
use crate::remotestate::{SnapshotReceiver, Watcher, snapshot_mailbox};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Task relaying remote changes to a running operation.
///
/// Every change raises `fire` so the loop takes another look once the
/// operation finishes, and the latest snapshot goes into the operation's
/// mailbox.
pub(crate) struct Forwarder {
    done: CancellationToken,
    handle: JoinHandle<()>,
}

impl Forwarder {
    pub(crate) fn spawn(watcher: Arc<dyn Watcher>, fire: Arc<Notify>) -> (Self, SnapshotReceiver) {
        let (tx, rx) = snapshot_mailbox();
        let done = CancellationToken::new();
        let stopped = done.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = stopped.cancelled() => break,
                    () = watcher.changed() => {
                        fire.notify_one();
                        let snapshot = watcher.snapshot();
                        tracing::trace!(version = snapshot.version, "forwarding remote state");
                        tx.send(snapshot);
                    }
                }
            }
        });

        (Self { done, handle }, rx)
    }

    /// Signal the task to finish and wait for it.
    pub(crate) async fn stop(self) -> Result<(), LoopError> {
        self.done.cancel();
        self.handle
            .await
            .map_err(|e| LoopError::Forwarder(e.to_string()))
    }
}
