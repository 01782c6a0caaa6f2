use super::local::{LocalState, LocalStateFile, SharedLocalState, lock};
use crate::error::OperationError;
use crate::operation::{Factory, HookInfo, HookKind, Operation, State};
use crate::remotestate::Snapshot;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

type CommitHook = Box<dyn Fn(&mut LocalState) + Send + Sync>;

/// [`Factory`] handed to resolvers by the loop.
///
/// Every operation it builds remembers which remote version it satisfies
/// and records that into [`LocalState`] once its commit succeeds, so the
/// next decision sees the work as done. With a [`LocalStateFile`] attached
/// the updated state is also saved before the commit is reported.
pub struct ResolverOpFactory {
    factory: Arc<dyn Factory>,
    local: SharedLocalState,
    remote: Snapshot,
    store: Option<LocalStateFile>,
}

impl ResolverOpFactory {
    pub fn new(factory: Arc<dyn Factory>, local: SharedLocalState, remote: Snapshot) -> Self {
        Self {
            factory,
            local,
            remote,
            store: None,
        }
    }

    pub fn persisting(mut self, store: LocalStateFile) -> Self {
        self.store = Some(store);
        self
    }

    fn wrap(&self, inner: Box<dyn Operation>, on_commit: CommitHook) -> Box<dyn Operation> {
        Box::new(OnCommit {
            inner,
            local: Arc::clone(&self.local),
            store: self.store.clone(),
            on_commit,
        })
    }

    fn charm_deployed(&self, charm_url: &str) -> CommitHook {
        let charm_url = charm_url.to_string();
        let modified = self.remote.charm_modified_version;
        Box::new(move |local: &mut LocalState| {
            local.charm_url = Some(charm_url.clone());
            local.charm_modified_version = modified;
        })
    }

    fn hook_handled(&self, hook: &HookInfo) -> Option<CommitHook> {
        let remote = &self.remote;
        let on_commit: CommitHook = match (hook.kind, hook.relation_id) {
            (HookKind::ConfigChanged, _) => {
                let version = remote.config_version;
                Box::new(move |local: &mut LocalState| local.config_version = version)
            }
            (HookKind::LeaderSettingsChanged, _) => {
                let version = remote.leader_settings_version;
                Box::new(move |local: &mut LocalState| local.leader_settings_version = version)
            }
            (HookKind::UpdateStatus, _) => {
                let version = remote.update_status_version;
                Box::new(move |local: &mut LocalState| local.update_status_version = version)
            }
            (HookKind::RelationJoined | HookKind::RelationChanged, Some(id)) => {
                let version = remote.relations.get(&id).map_or(0, |r| r.change_version);
                Box::new(move |local: &mut LocalState| {
                    local.relations.insert(id, version);
                })
            }
            (HookKind::RelationBroken, Some(id)) => Box::new(move |local: &mut LocalState| {
                local.relations.remove(&id);
            }),
            _ => return None,
        };
        Some(on_commit)
    }
}

impl Factory for ResolverOpFactory {
    fn new_install(&self, charm_url: &str) -> Result<Box<dyn Operation>, OperationError> {
        let op = self.factory.new_install(charm_url)?;
        Ok(self.wrap(op, self.charm_deployed(charm_url)))
    }

    fn new_upgrade(&self, charm_url: &str) -> Result<Box<dyn Operation>, OperationError> {
        let op = self.factory.new_upgrade(charm_url)?;
        Ok(self.wrap(op, self.charm_deployed(charm_url)))
    }

    fn new_run_hook(&self, hook: HookInfo) -> Result<Box<dyn Operation>, OperationError> {
        let on_commit = self.hook_handled(&hook);
        let op = self.factory.new_run_hook(hook)?;
        Ok(match on_commit {
            Some(on_commit) => self.wrap(op, on_commit),
            None => op,
        })
    }

    fn new_action(&self, action_id: &str) -> Result<Box<dyn Operation>, OperationError> {
        let op = self.factory.new_action(action_id)?;
        let action_id = action_id.to_string();
        let queued = self.remote.actions.clone();
        Ok(self.wrap(
            op,
            Box::new(move |local: &mut LocalState| {
                // Ids the remote side no longer lists can never come back.
                local
                    .completed_actions
                    .retain(|id| queued.iter().any(|q| q == id));
                local.completed_actions.insert(action_id.clone());
            }),
        ))
    }

    fn new_continue(&self) -> Result<Box<dyn Operation>, OperationError> {
        self.factory.new_continue()
    }
}

struct OnCommit {
    inner: Box<dyn Operation>,
    local: SharedLocalState,
    store: Option<LocalStateFile>,
    on_commit: CommitHook,
}

impl fmt::Display for OnCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[async_trait]
impl Operation for OnCommit {
    async fn prepare(&self, state: &State) -> Result<Option<State>, OperationError> {
        self.inner.prepare(state).await
    }

    async fn execute(&self, state: &State) -> Result<Option<State>, OperationError> {
        self.inner.execute(state).await
    }

    async fn commit(&self, state: &State) -> Result<Option<State>, OperationError> {
        let next = self.inner.commit(state).await?;
        let mut local = lock(&self.local);
        (self.on_commit)(&mut local);
        if let Some(store) = &self.store {
            store.save(&local).map_err(anyhow::Error::from)?;
        }
        Ok(next)
    }

    fn remote_state_changed(&self, snapshot: &Snapshot) {
        self.inner.remote_state_changed(snapshot);
    }
}
