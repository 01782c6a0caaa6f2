use super::{LocalState, NextOp, Resolver};
use crate::error::ResolverError;
use crate::operation::{Factory, HookInfo, HookKind, Kind, State, Step};
use crate::remotestate::{Life, Snapshot};

/// Resolver implementing the standard unit lifecycle.
///
/// Interrupted work recorded in [`State`] is finished first. After that the
/// unit is stopped when dying, upgraded when the charm changed, started,
/// and then kept in step with leadership, config, relations, actions and
/// status updates, in that order.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniterResolver;

impl UniterResolver {
    pub fn new() -> Self {
        Self
    }

    fn resume(
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<Option<NextOp>, ResolverError> {
        let state = &local.state;
        let next = match (state.kind, state.step) {
            (Kind::None, _) => match &remote.charm_url {
                Some(url) => NextOp::Run(factory.new_install(url)?),
                None => NextOp::Waiting,
            },
            (Kind::Install, _) => NextOp::Run(factory.new_install(recorded_charm(state)?)?),
            (Kind::Upgrade, _) => NextOp::Run(factory.new_upgrade(recorded_charm(state)?)?),
            (Kind::RunHook, Step::Queued | Step::Pending) => {
                NextOp::Run(factory.new_run_hook(recorded_hook(state)?.clone())?)
            }
            (Kind::RunHook, Step::Done)
                if state.hook.as_ref().is_some_and(|h| h.kind.is_upgrade_charm()) =>
            {
                NextOp::Run(factory.new_continue()?)
            }
            (Kind::RunAction, Step::Pending) => {
                let action_id = state.action_id.as_deref().ok_or_else(|| {
                    ResolverError::InvalidState(format!("{state}: no action id"))
                })?;
                NextOp::Run(factory.new_action(action_id)?)
            }
            (Kind::RunAction, _) => NextOp::Run(factory.new_continue()?),
            _ => return Ok(None),
        };
        Ok(Some(next))
    }
}

fn recorded_charm(state: &State) -> Result<&str, ResolverError> {
    state
        .charm_url
        .as_deref()
        .ok_or_else(|| ResolverError::InvalidState(format!("{state}: no charm url")))
}

fn recorded_hook(state: &State) -> Result<&HookInfo, ResolverError> {
    state
        .hook
        .as_ref()
        .ok_or_else(|| ResolverError::InvalidState(format!("{state}: no hook")))
}

fn needs_upgrade(local: &LocalState, remote: &Snapshot) -> Option<String> {
    let url = remote.charm_url.as_ref()?;
    let changed = local.charm_url.as_ref() != Some(url);
    let forced = remote.force_charm_upgrade
        && remote.charm_modified_version != local.charm_modified_version;
    (changed || forced).then(|| url.clone())
}

fn relation_hook(local: &LocalState, remote: &Snapshot) -> Option<HookInfo> {
    for (&id, relation) in &remote.relations {
        let alive = relation.life == Life::Alive;
        match local.relations.get(&id) {
            None if alive => return Some(HookInfo::relation(HookKind::RelationJoined, id)),
            Some(_) if !alive => return Some(HookInfo::relation(HookKind::RelationBroken, id)),
            Some(&seen) if seen != relation.change_version => {
                return Some(HookInfo::relation(HookKind::RelationChanged, id));
            }
            _ => {}
        }
    }
    local
        .relations
        .keys()
        .find(|id| !remote.relations.contains_key(*id))
        .map(|&id| HookInfo::relation(HookKind::RelationBroken, id))
}

impl Resolver for UniterResolver {
    fn next_op(
        &self,
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<NextOp, ResolverError> {
        if let Some(next) = Self::resume(local, remote, factory)? {
            return Ok(next);
        }

        let state = &local.state;
        let hook = |kind: HookKind| -> Result<NextOp, ResolverError> {
            Ok(NextOp::Run(factory.new_run_hook(HookInfo::new(kind))?))
        };

        if remote.life != Life::Alive {
            if state.started && !state.stopped {
                return hook(HookKind::Stop);
            }
            return Ok(NextOp::NoOperation);
        }
        if let Some(url) = needs_upgrade(local, remote) {
            return Ok(NextOp::Run(factory.new_upgrade(&url)?));
        }
        if !state.started {
            return hook(HookKind::Start);
        }
        if remote.leader && !state.leader {
            return hook(HookKind::LeaderElected);
        }
        if remote.config_version != local.config_version {
            return hook(HookKind::ConfigChanged);
        }
        // A deposed leader runs leader-settings-changed, which clears the flag.
        if !remote.leader
            && (state.leader || remote.leader_settings_version != local.leader_settings_version)
        {
            return hook(HookKind::LeaderSettingsChanged);
        }
        if let Some(relation) = relation_hook(local, remote) {
            return Ok(NextOp::Run(factory.new_run_hook(relation)?));
        }
        if let Some(action) = remote
            .actions
            .iter()
            .find(|id| !local.completed_actions.contains(*id))
        {
            return Ok(NextOp::Run(factory.new_action(action)?));
        }
        if remote.update_status_version != local.update_status_version {
            return hook(HookKind::UpdateStatus);
        }
        Ok(NextOp::NoOperation)
    }
}
