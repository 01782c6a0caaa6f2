use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Life {
    #[default]
    Alive,
    Dying,
    Dead,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    pub life: Life,
    /// Bumped by the controller whenever relation settings or membership change.
    pub change_version: u64,
}

/// Desired state of the unit at one point in time.
///
/// `version` and `observed_at` are stamped by the watcher on publish;
/// everything else is declared by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub observed_at: DateTime<Utc>,
    pub life: Life,
    pub charm_url: Option<String>,
    pub charm_modified_version: u64,
    pub force_charm_upgrade: bool,
    pub config_version: u64,
    pub leader: bool,
    pub leader_settings_version: u64,
    pub update_status_version: u64,
    pub relations: BTreeMap<i64, RelationSnapshot>,
    /// Ids of actions queued for this unit, oldest first.
    pub actions: Vec<String>,
}

impl Snapshot {
    pub fn with_charm_url(url: impl Into<String>) -> Self {
        Self {
            charm_url: Some(url.into()),
            ..Self::default()
        }
    }
}
