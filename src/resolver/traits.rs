use super::LocalState;
use crate::error::ResolverError;
use crate::operation::{Factory, Operation};
use crate::remotestate::Snapshot;
use std::fmt;
use std::sync::Arc;

/// What a resolver wants the loop to do next.
pub enum NextOp {
    /// Run this operation, then ask again.
    Run(Box<dyn Operation>),
    /// Local state already matches remote state.
    NoOperation,
    /// Something outside the unit has to happen first. Not idle.
    Waiting,
    /// Stop consulting further resolvers. A [`ResolverChain`] reports it as
    /// `Waiting`; a bare `DoNotProceed` that reaches the loop is fatal.
    DoNotProceed,
}

impl NextOp {
    pub fn is_run(&self) -> bool {
        matches!(self, Self::Run(_))
    }
}

impl fmt::Debug for NextOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(op) => write!(f, "Run({op})"),
            Self::NoOperation => f.write_str("NoOperation"),
            Self::Waiting => f.write_str("Waiting"),
            Self::DoNotProceed => f.write_str("DoNotProceed"),
        }
    }
}

/// Decides the next operation from local and remote state.
///
/// Implementations must be deterministic and must not block: the loop calls
/// them inline between operations.
pub trait Resolver: Send + Sync {
    fn next_op(
        &self,
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<NextOp, ResolverError>;
}

/// Adapts a closure into a [`Resolver`].
pub struct ResolverFn<F>(F);

impl<F> ResolverFn<F>
where
    F: Fn(&LocalState, &Snapshot, &dyn Factory) -> Result<NextOp, ResolverError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Resolver for ResolverFn<F>
where
    F: Fn(&LocalState, &Snapshot, &dyn Factory) -> Result<NextOp, ResolverError> + Send + Sync,
{
    fn next_op(
        &self,
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<NextOp, ResolverError> {
        (self.0)(local, remote, factory)
    }
}

/// Consults resolvers in order.
///
/// The first `Run` or `Waiting` answer wins and `NoOperation` falls through.
/// `DoNotProceed` ends the chain early and is reported as `Waiting`: the
/// veto holds the unit back, so it must never count as idle.
#[derive(Default, Clone)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn push(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Resolver for ResolverChain {
    fn next_op(
        &self,
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<NextOp, ResolverError> {
        for resolver in &self.resolvers {
            match resolver.next_op(local, remote, factory)? {
                NextOp::NoOperation => {}
                NextOp::DoNotProceed => return Ok(NextOp::Waiting),
                decided => return Ok(decided),
            }
        }
        Ok(NextOp::NoOperation)
    }
}
