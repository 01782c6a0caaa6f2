use crate::error::StateError;
use crate::operation::State;
use crate::operation::state_file::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Executor state plus the remote versions this unit has already acted on.
///
/// The version fields only move when an operation built by
/// [`ResolverOpFactory`](super::ResolverOpFactory) commits. Joined
/// relations and completed actions survive a restart through
/// [`LocalStateFile`]; the other versions live in memory, so a restarted
/// agent reruns config-changed and update-status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalState {
    pub state: State,
    pub charm_url: Option<String>,
    pub charm_modified_version: u64,
    pub config_version: u64,
    pub leader_settings_version: u64,
    pub update_status_version: u64,
    /// Relation id to the change version last handled.
    pub relations: BTreeMap<i64, u64>,
    pub completed_actions: BTreeSet<String>,
}

pub type SharedLocalState = Arc<Mutex<LocalState>>;

impl LocalState {
    /// Seed local state from a loaded executor state. An installed unit
    /// already has its charm.
    pub fn new(state: State) -> Self {
        let charm_url = if state.installed {
            state.charm_url.clone()
        } else {
            None
        };
        Self {
            state,
            charm_url,
            ..Self::default()
        }
    }

    pub fn shared(self) -> SharedLocalState {
        Arc::new(Mutex::new(self))
    }
}

/// The part of [`LocalState`] that must not be replayed after a restart.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Handled {
    #[serde(default)]
    relations: BTreeMap<i64, u64>,
    #[serde(default)]
    completed_actions: BTreeSet<String>,
}

/// JSON file next to the operation state recording joined relations and
/// completed actions.
#[derive(Debug, Clone)]
pub struct LocalStateFile {
    path: PathBuf,
}

impl LocalStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed local state from `state` and whatever an earlier run recorded.
    pub fn load(&self, state: State) -> Result<LocalState, StateError> {
        let mut local = LocalState::new(state);
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(local),
            Err(source) => return Err(self.io_error(source)),
        };
        let handled: Handled =
            serde_json::from_str(&raw).map_err(|source| self.parse_error(source))?;
        local.relations = handled.relations;
        local.completed_actions = handled.completed_actions;
        Ok(local)
    }

    pub fn save(&self, local: &LocalState) -> Result<(), StateError> {
        let handled = Handled {
            relations: local.relations.clone(),
            completed_actions: local.completed_actions.clone(),
        };
        let json =
            serde_json::to_string_pretty(&handled).map_err(|source| self.parse_error(source))?;
        write_atomic(&self.path, &json).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn parse_error(&self, source: serde_json::Error) -> StateError {
        StateError::Parse {
            path: self.path.display().to_string(),
            source,
        }
    }
}

pub(crate) fn lock(local: &SharedLocalState) -> MutexGuard<'_, LocalState> {
    local.lock().unwrap_or_else(PoisonError::into_inner)
}
