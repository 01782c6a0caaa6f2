//! Built-in operations and the state transitions they record.
//!
//! | operation | prepare            | execute          | commit                   |
//! |-----------|--------------------|------------------|--------------------------|
//! | install   | install pending    | install done     | run-hook install queued  |
//! | upgrade   | upgrade pending    | upgrade done     | run-hook upgrade-charm queued |
//! | run-hook  | run-hook pending   | run-hook done    | (unchanged)              |
//! | action    | run-action pending | run-action done  | continue pending         |
//! | continue  | (unchanged)        | (unchanged)      | continue pending         |

use super::factory::{Deployer, HookRunner};
use super::{HookInfo, HookKind, Kind, Operation, State, StateChange, Step};
use crate::error::OperationError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub(crate) struct DeployOp {
    kind: Kind,
    charm_url: String,
    deployer: Arc<dyn Deployer>,
}

impl DeployOp {
    pub(crate) fn install(charm_url: &str, deployer: Arc<dyn Deployer>) -> Self {
        Self {
            kind: Kind::Install,
            charm_url: charm_url.to_string(),
            deployer,
        }
    }

    pub(crate) fn upgrade(charm_url: &str, deployer: Arc<dyn Deployer>) -> Self {
        Self {
            kind: Kind::Upgrade,
            charm_url: charm_url.to_string(),
            deployer,
        }
    }

    fn change(&self, step: Step) -> StateChange {
        StateChange::new(self.kind, step).with_charm(self.charm_url.clone())
    }
}

impl fmt::Display for DeployOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Upgrade => write!(f, "upgrade to {}", self.charm_url),
            _ => write!(f, "install {}", self.charm_url),
        }
    }
}

#[async_trait]
impl Operation for DeployOp {
    async fn prepare(&self, state: &State) -> Result<Option<State>, OperationError> {
        Ok(Some(self.change(Step::Pending).apply(state)))
    }

    async fn execute(&self, state: &State) -> Result<Option<State>, OperationError> {
        let upgrade = self.kind == Kind::Upgrade;
        self.deployer
            .deploy(&self.charm_url, upgrade)
            .await
            .map_err(|e| OperationError::Deploy {
                charm_url: self.charm_url.clone(),
                message: format!("{e:#}"),
            })?;
        Ok(Some(self.change(Step::Done).apply(state)))
    }

    async fn commit(&self, state: &State) -> Result<Option<State>, OperationError> {
        let hook = if self.kind == Kind::Upgrade {
            HookKind::UpgradeCharm
        } else {
            HookKind::Install
        };
        Ok(Some(
            StateChange::new(Kind::RunHook, Step::Queued)
                .with_hook(HookInfo::new(hook))
                .apply(state),
        ))
    }
}

pub(crate) struct RunHookOp {
    hook: HookInfo,
    runner: Arc<dyn HookRunner>,
}

impl RunHookOp {
    pub(crate) fn new(hook: HookInfo, runner: Arc<dyn HookRunner>) -> Self {
        Self { hook, runner }
    }

    fn change(&self, step: Step) -> StateChange {
        StateChange::new(Kind::RunHook, step).with_hook(self.hook.clone())
    }
}

impl fmt::Display for RunHookOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run hook {}", self.hook)
    }
}

#[async_trait]
impl Operation for RunHookOp {
    async fn prepare(&self, state: &State) -> Result<Option<State>, OperationError> {
        Ok(Some(self.change(Step::Pending).apply(state)))
    }

    async fn execute(&self, state: &State) -> Result<Option<State>, OperationError> {
        self.runner
            .run_hook(&self.hook)
            .await
            .map_err(|e| OperationError::Hook {
                hook: self.hook.to_string(),
                message: format!("{e:#}"),
            })?;

        let mut next = self.change(Step::Done).apply(state);
        match self.hook.kind {
            HookKind::Install => next.installed = true,
            HookKind::Start => {
                next.started = true;
                next.stopped = false;
            }
            HookKind::Stop => next.stopped = true,
            HookKind::LeaderElected => next.leader = true,
            // Only followers see leader settings changes.
            HookKind::LeaderSettingsChanged => next.leader = false,
            _ => {}
        }
        Ok(Some(next))
    }

    async fn commit(&self, _state: &State) -> Result<Option<State>, OperationError> {
        Ok(None)
    }
}

pub(crate) struct RunActionOp {
    action_id: String,
    runner: Arc<dyn HookRunner>,
}

impl RunActionOp {
    pub(crate) fn new(action_id: &str, runner: Arc<dyn HookRunner>) -> Self {
        Self {
            action_id: action_id.to_string(),
            runner,
        }
    }
}

impl fmt::Display for RunActionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run action {}", self.action_id)
    }
}

#[async_trait]
impl Operation for RunActionOp {
    async fn prepare(&self, state: &State) -> Result<Option<State>, OperationError> {
        Ok(Some(
            StateChange::new(Kind::RunAction, Step::Pending)
                .with_action(self.action_id.clone())
                .apply(state),
        ))
    }

    async fn execute(&self, state: &State) -> Result<Option<State>, OperationError> {
        self.runner
            .run_action(&self.action_id)
            .await
            .map_err(|e| OperationError::Action {
                action_id: self.action_id.clone(),
                message: format!("{e:#}"),
            })?;
        Ok(Some(
            StateChange::new(Kind::RunAction, Step::Done)
                .with_action(self.action_id.clone())
                .apply(state),
        ))
    }

    async fn commit(&self, state: &State) -> Result<Option<State>, OperationError> {
        Ok(Some(StateChange::new(Kind::Continue, Step::Pending).apply(state)))
    }
}

/// Returns the unit to normal operation, clearing any finished hook record.
pub(crate) struct ContinueOp;

impl fmt::Display for ContinueOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("continue")
    }
}

#[async_trait]
impl Operation for ContinueOp {
    async fn prepare(&self, _state: &State) -> Result<Option<State>, OperationError> {
        Ok(None)
    }

    async fn execute(&self, _state: &State) -> Result<Option<State>, OperationError> {
        Ok(None)
    }

    async fn commit(&self, state: &State) -> Result<Option<State>, OperationError> {
        Ok(Some(StateChange::new(Kind::Continue, Step::Pending).apply(state)))
    }
}
