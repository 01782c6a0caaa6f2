//! Supervision of a running resolver loop.

use crate::error::LoopError;
use crate::resolver::{LoopConfig, SharedLocalState, run_loop};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a resolver loop running on the tokio runtime.
///
/// The loop gets a child of the configured abort token, so cancelling
/// either the configured token or the worker stops it.
pub struct UniterWorker {
    abort: CancellationToken,
    handle: JoinHandle<Result<(), LoopError>>,
}

impl UniterWorker {
    pub fn spawn(mut config: LoopConfig, local: SharedLocalState) -> Self {
        let abort = config.abort.child_token();
        config.abort = abort.clone();
        let handle = tokio::spawn(async move {
            let result = run_loop(&config, &local).await;
            config.observer.flush();
            result
        });
        Self { abort, handle }
    }

    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the loop and wait for it to exit.
    pub async fn stop(self) -> Result<(), LoopError> {
        self.abort.cancel();
        self.wait().await
    }

    /// Wait for the loop to exit on its own. An abort counts as a clean exit.
    pub async fn wait(self) -> Result<(), LoopError> {
        match self.handle.await {
            Ok(Err(e)) if e.is_aborted() => {
                tracing::debug!("resolver loop stopped");
                Ok(())
            }
            Ok(result) => result,
            Err(e) => Err(LoopError::Task(e.to_string())),
        }
    }
}
