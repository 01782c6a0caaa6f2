use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of the operation recorded in [`State`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Kind {
    /// Nothing has been recorded for this unit yet.
    #[default]
    None,
    Install,
    Upgrade,
    RunHook,
    RunAction,
    Continue,
}

/// Position of the recorded operation within its lifecycle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Step {
    /// Scheduled by a previous operation, not started.
    Queued,
    /// Started; may or may not have completed before the agent stopped.
    Pending,
    #[default]
    Done,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HookKind {
    Install,
    Start,
    ConfigChanged,
    UpgradeCharm,
    Stop,
    LeaderElected,
    LeaderSettingsChanged,
    UpdateStatus,
    RelationJoined,
    RelationChanged,
    RelationBroken,
}

impl HookKind {
    pub fn is_upgrade_charm(self) -> bool {
        self == Self::UpgradeCharm
    }

    pub fn is_relation(self) -> bool {
        matches!(
            self,
            Self::RelationJoined | Self::RelationChanged | Self::RelationBroken
        )
    }
}

/// Identifies one hook execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInfo {
    pub kind: HookKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_id: Option<i64>,
}

impl HookInfo {
    pub fn new(kind: HookKind) -> Self {
        Self {
            kind,
            relation_id: None,
        }
    }

    pub fn relation(kind: HookKind, relation_id: i64) -> Self {
        Self {
            kind,
            relation_id: Some(relation_id),
        }
    }

    pub fn validate(&self) -> Result<(), StateError> {
        match (self.kind.is_relation(), self.relation_id) {
            (true, None) => Err(StateError::Invalid(format!(
                "{} hook requires a relation id",
                self.kind
            ))),
            (false, Some(id)) => Err(StateError::Invalid(format!(
                "{} hook must not carry relation id {id}",
                self.kind
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for HookInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation_id {
            Some(id) => write!(f, "{} (relation {id})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Persisted execution state of a unit. Written only by the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub kind: Kind,
    pub step: Step,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<HookInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    /// Charm being deployed while installing or upgrading, otherwise the
    /// charm last deployed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charm_url: Option<String>,
    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub stopped: bool,
    #[serde(default)]
    pub leader: bool,
}

/// The kind-specific part of a state transition. Lifecycle flags and the
/// deployed charm carry over from the previous state unless overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub kind: Kind,
    pub step: Step,
    pub hook: Option<HookInfo>,
    pub action_id: Option<String>,
    pub charm_url: Option<String>,
}

impl StateChange {
    pub fn new(kind: Kind, step: Step) -> Self {
        Self {
            kind,
            step,
            hook: None,
            action_id: None,
            charm_url: None,
        }
    }

    pub fn with_hook(mut self, hook: HookInfo) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_action(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = Some(action_id.into());
        self
    }

    pub fn with_charm(mut self, charm_url: impl Into<String>) -> Self {
        self.charm_url = Some(charm_url.into());
        self
    }

    pub fn apply(self, state: &State) -> State {
        State {
            kind: self.kind,
            step: self.step,
            hook: self.hook,
            action_id: self.action_id,
            charm_url: self.charm_url.or_else(|| state.charm_url.clone()),
            ..state.clone()
        }
    }
}

impl State {
    pub fn validate(&self) -> Result<(), StateError> {
        let invalid = |msg: &str| Err(StateError::Invalid(format!("{}: {msg}", self.kind)));

        if let Some(hook) = &self.hook {
            hook.validate()?;
        }
        match self.kind {
            Kind::None => {
                if self.hook.is_some() || self.action_id.is_some() {
                    return invalid("no operation recorded but hook or action present");
                }
            }
            Kind::Install | Kind::Upgrade => {
                if self.charm_url.is_none() {
                    return invalid("missing charm url");
                }
                if self.step == Step::Queued {
                    return invalid("charm deployment cannot be queued");
                }
                if self.action_id.is_some() {
                    return invalid("unexpected action id");
                }
            }
            Kind::RunHook => {
                if self.hook.is_none() {
                    return invalid("missing hook info");
                }
                if self.action_id.is_some() {
                    return invalid("unexpected action id");
                }
            }
            Kind::RunAction => {
                if self.action_id.as_deref().is_none_or(str::is_empty) {
                    return invalid("missing action id");
                }
                if self.step == Step::Queued {
                    return invalid("actions cannot be queued");
                }
            }
            Kind::Continue => {
                if self.step != Step::Pending {
                    return invalid("continue must be pending");
                }
                if self.action_id.is_some() {
                    return invalid("unexpected action id");
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.step)?;
        if let Some(hook) = &self.hook {
            write!(f, " hook={hook}")?;
        }
        if let Some(action) = &self.action_id {
            write!(f, " action={action}")?;
        }
        if let Some(charm) = &self.charm_url {
            write!(f, " charm={charm}")?;
        }
        write!(
            f,
            " installed={} started={} stopped={}",
            self.installed, self.started, self.stopped
        )
    }
}
