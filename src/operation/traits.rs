use super::State;
use crate::error::OperationError;
use crate::remotestate::Snapshot;
use async_trait::async_trait;
use std::fmt;

/// One unit of work with a defined effect on [`State`].
///
/// The executor drives the three phases in order and persists every state
/// a phase returns before starting the next one. Returning `None` leaves
/// the recorded state untouched.
#[async_trait]
pub trait Operation: Send + Sync + fmt::Display {
    async fn prepare(&self, state: &State) -> Result<Option<State>, OperationError>;

    async fn execute(&self, state: &State) -> Result<Option<State>, OperationError>;

    async fn commit(&self, state: &State) -> Result<Option<State>, OperationError>;

    /// Called while `execute` is in flight whenever newer remote state
    /// arrives. Only the latest snapshot is ever delivered.
    fn remote_state_changed(&self, _snapshot: &Snapshot) {}
}
