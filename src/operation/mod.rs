//! Operations, their persisted state, and the executor that runs them.

pub mod executor;
pub mod factory;
mod ops;
pub mod state;
pub mod state_file;
pub mod traits;

pub use executor::{Executor, StateExecutor};
pub use factory::{Deployer, Factory, HookRunner, OperationFactory};
pub use state::{HookInfo, HookKind, Kind, State, StateChange, Step};
pub use state_file::StateFile;
pub use traits::Operation;
