#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod error;
pub mod fortress;
#[doc(hidden)]
pub mod observability;
pub mod operation;
pub mod remotestate;
pub mod resolver;
pub mod worker;

pub use config::UniterConfig;
pub use error::{CharmloopError, LoopError, Result};
pub use fortress::{Fortress, Guard};
pub use operation::{Executor, Factory, Operation, OperationFactory, State, StateExecutor};
pub use remotestate::{Snapshot, SnapshotWatcher, Watcher};
pub use resolver::{
    LocalState, LoopConfig, NextOp, Resolver, ResolverChain, ResolverFn, UniterResolver, run_loop,
};
pub use worker::UniterWorker;
