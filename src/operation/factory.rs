use super::ops::{ContinueOp, DeployOp, RunActionOp, RunHookOp};
use super::{HookInfo, Operation};
use crate::error::OperationError;
use async_trait::async_trait;
use std::sync::Arc;

/// Builds operations for resolvers. Construction is cheap and performs
/// no I/O; failures here are argument errors.
pub trait Factory: Send + Sync {
    fn new_install(&self, charm_url: &str) -> Result<Box<dyn Operation>, OperationError>;

    fn new_upgrade(&self, charm_url: &str) -> Result<Box<dyn Operation>, OperationError>;

    fn new_run_hook(&self, hook: HookInfo) -> Result<Box<dyn Operation>, OperationError>;

    fn new_action(&self, action_id: &str) -> Result<Box<dyn Operation>, OperationError>;

    fn new_continue(&self) -> Result<Box<dyn Operation>, OperationError>;
}

/// Writes charm content into the unit's charm directory.
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(&self, charm_url: &str, upgrade: bool) -> anyhow::Result<()>;
}

/// Executes hooks and actions against the deployed charm.
#[async_trait]
pub trait HookRunner: Send + Sync {
    async fn run_hook(&self, hook: &HookInfo) -> anyhow::Result<()>;

    async fn run_action(&self, action_id: &str) -> anyhow::Result<()>;
}

/// [`Factory`] producing the built-in operations.
#[derive(Clone)]
pub struct OperationFactory {
    deployer: Arc<dyn Deployer>,
    runner: Arc<dyn HookRunner>,
}

impl OperationFactory {
    pub fn new(deployer: Arc<dyn Deployer>, runner: Arc<dyn HookRunner>) -> Self {
        Self { deployer, runner }
    }
}

fn require(value: &str, what: &str) -> Result<(), OperationError> {
    if value.trim().is_empty() {
        return Err(OperationError::InvalidArgument(format!("empty {what}")));
    }
    Ok(())
}

impl Factory for OperationFactory {
    fn new_install(&self, charm_url: &str) -> Result<Box<dyn Operation>, OperationError> {
        require(charm_url, "charm url")?;
        Ok(Box::new(DeployOp::install(
            charm_url,
            Arc::clone(&self.deployer),
        )))
    }

    fn new_upgrade(&self, charm_url: &str) -> Result<Box<dyn Operation>, OperationError> {
        require(charm_url, "charm url")?;
        Ok(Box::new(DeployOp::upgrade(
            charm_url,
            Arc::clone(&self.deployer),
        )))
    }

    fn new_run_hook(&self, hook: HookInfo) -> Result<Box<dyn Operation>, OperationError> {
        hook.validate()
            .map_err(|e| OperationError::InvalidArgument(e.to_string()))?;
        Ok(Box::new(RunHookOp::new(hook, Arc::clone(&self.runner))))
    }

    fn new_action(&self, action_id: &str) -> Result<Box<dyn Operation>, OperationError> {
        require(action_id, "action id")?;
        Ok(Box::new(RunActionOp::new(
            action_id,
            Arc::clone(&self.runner),
        )))
    }

    fn new_continue(&self) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(ContinueOp))
    }
}
