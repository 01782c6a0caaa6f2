use super::{Operation, State, StateFile};
use crate::config::UniterConfig;
use crate::error::{ExecutorError, OperationError, StateError};
use crate::remotestate::SnapshotReceiver;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs operations one at a time and owns the persisted [`State`].
#[async_trait]
pub trait Executor: Send + Sync {
    /// Last committed (or partially committed) state.
    fn state(&self) -> State;

    /// Run `op` to completion, persisting each phase's state change.
    ///
    /// `remote` delivers newer remote snapshots to the operation while it
    /// executes. A failure leaves the state written by the last phase that
    /// succeeded.
    async fn run(
        &self,
        op: Box<dyn Operation>,
        remote: SnapshotReceiver,
    ) -> Result<(), ExecutorError>;
}

/// [`Executor`] backed by a [`StateFile`].
pub struct StateExecutor {
    file: StateFile,
    state: ArcSwap<State>,
    running: Mutex<()>,
}

impl StateExecutor {
    /// Load the persisted state, starting from `State::default()` for a
    /// fresh unit.
    pub fn new(file: StateFile) -> Result<Self, StateError> {
        let state = file.read()?.unwrap_or_default();
        tracing::debug!(path = %file.path().display(), state = %state, "operation state loaded");
        Ok(Self {
            file,
            state: ArcSwap::from_pointee(state),
            running: Mutex::new(()),
        })
    }

    pub fn from_config(config: &UniterConfig) -> Result<Self, StateError> {
        Self::new(StateFile::new(config.state_file_path()))
    }

    fn write_state(&self, next: State) -> Result<(), StateError> {
        self.file.write(&next)?;
        tracing::trace!(state = %next, "operation state written");
        self.state.store(Arc::new(next));
        Ok(())
    }

    fn record(
        &self,
        phase: &'static str,
        op: &str,
        result: Result<Option<State>, OperationError>,
    ) -> Result<(), ExecutorError> {
        match result {
            Ok(Some(next)) => Ok(self.write_state(next)?),
            Ok(None) => Ok(()),
            Err(source) => {
                tracing::warn!(phase, op, error = %source, "operation failed");
                Err(ExecutorError::Operation {
                    phase,
                    op: op.to_string(),
                    source,
                })
            }
        }
    }
}

#[async_trait]
impl Executor for StateExecutor {
    fn state(&self) -> State {
        (**self.state.load()).clone()
    }

    async fn run(
        &self,
        op: Box<dyn Operation>,
        mut remote: SnapshotReceiver,
    ) -> Result<(), ExecutorError> {
        let _running = self.running.lock().await;
        let name = op.to_string();

        tracing::debug!(op = %name, "preparing operation");
        let prepared = op.prepare(&self.state()).await;
        self.record("prepare", &name, prepared)?;

        tracing::debug!(op = %name, "executing operation");
        let current = self.state();
        let execute = op.execute(&current);
        tokio::pin!(execute);
        let executed = loop {
            tokio::select! {
                result = &mut execute => break result,
                Some(snapshot) = remote.recv() => {
                    tracing::trace!(op = %name, version = snapshot.version, "remote state changed during operation");
                    op.remote_state_changed(&snapshot);
                }
            }
        };
        self.record("execute", &name, executed)?;

        tracing::debug!(op = %name, "committing operation");
        let committed = op.commit(&self.state()).await;
        self.record("commit", &name, committed)
    }
}
