//! Deciding and running the next operation for a unit.
//!
//! [`run_loop`] repeatedly asks a [`Resolver`] what to do given the unit's
//! [`LocalState`] and the latest remote [`Snapshot`](crate::remotestate::Snapshot),
//! hands each operation to the executor, and keeps the charm directory
//! guard in line with the resulting state.

pub mod charmdir;
mod forward;
pub mod local;
pub mod loop_;
pub mod op_factory;
pub mod traits;
pub mod uniter;

pub use charmdir::{charm_dir_available, update_charm_dir};
pub use local::{LocalState, LocalStateFile, SharedLocalState};
pub use op_factory::ResolverOpFactory;
pub use loop_::{IdleCallback, LoopConfig, run_loop};
pub use traits::{NextOp, Resolver, ResolverChain, ResolverFn};
pub use uniter::UniterResolver;
