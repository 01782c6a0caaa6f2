//! Availability gate over a shared resource (the unit's charm directory).
//!
//! The resolver loop is the only writer: it calls [`Guard::unlock`] and
//! [`Guard::lockdown`]. Everything else that reads the charm directory goes
//! through [`Fortress::visit`], which only runs while the fortress is
//! unlocked and holds back lockdown until the visit finishes.

use crate::error::GuardError;
use async_trait::async_trait;
use std::future::Future;
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;

/// Writer side of the fortress.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Allow visits. Idempotent.
    async fn unlock(&self) -> Result<(), GuardError>;

    /// Refuse new visits and wait for running ones to finish.
    ///
    /// Fails with [`GuardError::Aborted`] if `abort` fires first; the
    /// fortress stays locked either way.
    async fn lockdown(&self, abort: &CancellationToken) -> Result<(), GuardError>;
}

pub struct Fortress {
    unlocked: watch::Sender<bool>,
    visits: RwLock<()>,
}

impl Fortress {
    /// A new fortress starts locked.
    pub fn new() -> Self {
        let (unlocked, _) = watch::channel(false);
        Self {
            unlocked,
            visits: RwLock::new(()),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        *self.unlocked.borrow()
    }

    /// Wait until the fortress is unlocked, then run `visit` while holding
    /// off any lockdown.
    pub async fn visit<F, Fut, T>(&self, abort: &CancellationToken, visit: F) -> Result<T, GuardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut unlocked = self.unlocked.subscribe();
        loop {
            tokio::select! {
                biased;
                () = abort.cancelled() => return Err(GuardError::Aborted),
                () = wait_unlocked(&mut unlocked) => {}
            }

            let permit = tokio::select! {
                biased;
                () = abort.cancelled() => return Err(GuardError::Aborted),
                permit = self.visits.read() => permit,
            };

            // A lockdown may have slipped in between the two waits.
            if self.is_unlocked() {
                let out = visit().await;
                drop(permit);
                return Ok(out);
            }
        }
    }
}

impl Default for Fortress {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_unlocked(unlocked: &mut watch::Receiver<bool>) {
    // The sender lives as long as the fortress, so this only ends on unlock.
    let _ = unlocked.wait_for(|open| *open).await;
}

#[async_trait]
impl Guard for Fortress {
    async fn unlock(&self) -> Result<(), GuardError> {
        if !self.unlocked.send_replace(true) {
            tracing::trace!("fortress unlocked");
        }
        Ok(())
    }

    async fn lockdown(&self, abort: &CancellationToken) -> Result<(), GuardError> {
        if self.unlocked.send_replace(false) {
            tracing::trace!("fortress locking down");
        }
        tokio::select! {
            biased;
            _drained = self.visits.write() => Ok(()),
            () = abort.cancelled() => Err(GuardError::Aborted),
        }
    }
}
