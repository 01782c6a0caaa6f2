use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::Notify;

use charmloop::operation::{HookInfo, HookKind, Kind, State, Step};
use charmloop::remotestate::RelationSnapshot;
use charmloop::{Executor, Snapshot};

use super::unit_harness::{CHARM, RecordingRunner, Unit, eventually, seed_state, unit_config};

fn remote() -> Snapshot {
    let mut remote = Snapshot::with_charm_url(CHARM);
    remote.config_version = 1;
    remote.relations.insert(
        1,
        RelationSnapshot {
            change_version: 2,
            ..RelationSnapshot::default()
        },
    );
    remote
}

#[tokio::test]
async fn settled_unit_goes_idle_then_handles_relation_change() {
    let dir = TempDir::new().unwrap();
    seed_state(
        &unit_config(&dir),
        &State {
            kind: Kind::RunHook,
            step: Step::Done,
            hook: Some(HookInfo::new(HookKind::ConfigChanged)),
            charm_url: Some(CHARM.into()),
            installed: true,
            started: true,
            ..State::default()
        },
    );
    let gate = Arc::new(Notify::new());
    let runner = RecordingRunner {
        hook_gate: Some((HookKind::RelationChanged, Arc::clone(&gate))),
        ..RecordingRunner::default()
    };
    let unit = Unit::with_local(dir, remote(), runner, |local| {
        local.config_version = 1;
        local.relations.insert(1, 2);
    });

    let worker = unit.start();
    eventually("first idle", || unit.idle_calls() == 1).await;
    assert!(unit.fortress.is_unlocked());
    assert!(unit.runner.hooks().is_empty());

    unit.watcher
        .update(|s| s.relations.get_mut(&1).unwrap().change_version = 3);
    eventually("relation-changed to start", || {
        let state = unit.executor.state();
        state.step == Step::Pending
            && state.hook == Some(HookInfo::relation(HookKind::RelationChanged, 1))
    })
    .await;
    // Readers keep the charm dir while an ordinary hook runs.
    assert!(unit.fortress.is_unlocked());
    assert!(unit.runner.hooks().is_empty());

    gate.notify_one();
    eventually("relation-changed to run", || unit.idle_calls() == 2).await;

    let state = unit.executor.state();
    assert_eq!(state.kind, Kind::RunHook);
    assert_eq!(state.step, Step::Done);
    assert_eq!(
        state.hook,
        Some(HookInfo::relation(HookKind::RelationChanged, 1))
    );
    assert!(unit.fortress.is_unlocked());
    assert_eq!(unit.runner.hooks(), ["relation-changed (relation 1)"]);

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn interrupted_upgrade_keeps_charm_dir_locked() {
    let dir = TempDir::new().unwrap();
    seed_state(
        &unit_config(&dir),
        &State {
            kind: Kind::Upgrade,
            step: Step::Pending,
            charm_url: Some("ch:wordpress-13".into()),
            installed: true,
            started: true,
            ..State::default()
        },
    );
    let gate = Arc::new(Notify::new());
    let runner = RecordingRunner {
        deploy_gate: Some(Arc::clone(&gate)),
        ..RecordingRunner::default()
    };
    let mut target = remote();
    target.charm_url = Some("ch:wordpress-13".into());
    let unit = Unit::with_local(dir, target, runner, |local| {
        local.config_version = 1;
        local.relations.insert(1, 2);
    });

    let worker = unit.start();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!unit.fortress.is_unlocked());
    assert!(unit.runner.deploys().is_empty());

    gate.notify_one();
    eventually("upgrade to finish", || unit.idle_calls() == 1).await;

    assert_eq!(unit.runner.deploys(), ["upgrade ch:wordpress-13"]);
    assert_eq!(unit.runner.hooks(), ["upgrade-charm"]);
    let state = unit.executor.state();
    assert_eq!((state.kind, state.step), (Kind::Continue, Step::Pending));
    assert_eq!(state.charm_url.as_deref(), Some("ch:wordpress-13"));
    assert!(unit.fortress.is_unlocked());

    worker.stop().await.unwrap();
}
