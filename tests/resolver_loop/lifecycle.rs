use tempfile::TempDir;

use charmloop::operation::{HookKind, Kind, StateFile, Step};
use charmloop::remotestate::RelationSnapshot;
use charmloop::resolver::LocalStateFile;
use charmloop::{Executor, Snapshot};

use super::unit_harness::{CHARM, RecordingRunner, Unit, eventually};

fn remote() -> Snapshot {
    let mut remote = Snapshot::with_charm_url(CHARM);
    remote.config_version = 2;
    remote.leader = true;
    remote.update_status_version = 1;
    remote.actions = vec!["backup-1".into()];
    remote.relations.insert(
        4,
        RelationSnapshot {
            change_version: 1,
            ..RelationSnapshot::default()
        },
    );
    remote
}

#[tokio::test]
async fn fresh_unit_waits_for_a_charm() {
    let unit = Unit::new(
        TempDir::new().unwrap(),
        Snapshot::default(),
        RecordingRunner::default(),
    );
    let worker = unit.start();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(unit.idle_calls(), 0);
    assert!(unit.runner.deploys().is_empty());

    unit.watcher.publish(Snapshot::with_charm_url(CHARM));
    eventually("install and start", || unit.idle_calls() == 1).await;
    assert_eq!(unit.runner.deploys(), [format!("install {CHARM}")]);
    assert_eq!(unit.runner.hooks(), ["install", "start"]);

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn fresh_unit_converges_and_survives_restart() {
    let unit = Unit::new(TempDir::new().unwrap(), remote(), RecordingRunner::default());
    let worker = unit.start();

    eventually("unit to converge", || unit.idle_calls() == 1).await;
    worker.stop().await.unwrap();

    assert_eq!(unit.runner.deploys(), [format!("install {CHARM}")]);
    assert_eq!(
        unit.runner.hooks(),
        [
            "install",
            "start",
            "leader-elected",
            "config-changed",
            "relation-joined (relation 4)",
            "update-status",
        ]
    );
    assert_eq!(unit.runner.actions(), ["backup-1"]);
    assert!(unit.fortress.is_unlocked());

    let persisted = StateFile::new(unit.config.state_file_path())
        .read()
        .unwrap()
        .expect("state should be persisted");
    assert_eq!(persisted, unit.executor.state());
    assert_eq!((persisted.kind, persisted.step), (Kind::RunHook, Step::Done));
    assert_eq!(persisted.hook.map(|h| h.kind), Some(HookKind::UpdateStatus));
    assert!(persisted.installed && persisted.started && persisted.leader);

    let handled = LocalStateFile::new(unit.config.local_state_file_path())
        .load(unit.executor.state())
        .unwrap();
    assert_eq!(handled.relations.get(&4), Some(&1));
    assert!(handled.completed_actions.contains("backup-1"));

    // Joined relations and completed actions are remembered across a
    // restart. Config and status hooks run again; install and start never do.
    let Unit { dir, .. } = unit;
    let restarted = Unit::new(dir, remote(), RecordingRunner::default());
    let worker = restarted.start();
    eventually("restarted unit to converge", || restarted.idle_calls() == 1).await;
    worker.stop().await.unwrap();

    assert!(restarted.runner.deploys().is_empty());
    assert!(restarted.runner.actions().is_empty());
    assert_eq!(restarted.runner.hooks(), ["config-changed", "update-status"]);
}

#[tokio::test]
async fn leadership_is_lost_and_regained() {
    let unit = Unit::new(TempDir::new().unwrap(), remote(), RecordingRunner::default());
    let worker = unit.start();
    eventually("unit to converge", || unit.idle_calls() == 1).await;

    unit.watcher.update(|s| s.leader = false);
    eventually("deposition", || unit.idle_calls() == 2).await;
    assert!(!unit.executor.state().leader);

    unit.watcher.update(|s| s.leader = true);
    eventually("re-election", || unit.idle_calls() == 3).await;
    worker.stop().await.unwrap();

    let hooks = unit.runner.hooks();
    assert_eq!(
        hooks[hooks.len() - 2..],
        ["leader-settings-changed", "leader-elected"]
    );
    assert!(unit.executor.state().leader);
}

#[tokio::test]
async fn charm_change_upgrades_the_unit() {
    let unit = Unit::new(
        TempDir::new().unwrap(),
        Snapshot::with_charm_url(CHARM),
        RecordingRunner::default(),
    );
    let worker = unit.start();
    eventually("install", || unit.idle_calls() == 1).await;

    unit.watcher
        .update(|s| s.charm_url = Some("ch:wordpress-13".into()));
    eventually("upgrade", || unit.idle_calls() == 2).await;
    worker.stop().await.unwrap();

    assert_eq!(
        unit.runner.deploys(),
        [format!("install {CHARM}"), "upgrade ch:wordpress-13".to_string()]
    );
    assert_eq!(unit.runner.hooks(), ["install", "start", "upgrade-charm"]);
    let state = unit.executor.state();
    assert_eq!(state.kind, Kind::Continue);
    assert_eq!(state.charm_url.as_deref(), Some("ch:wordpress-13"));
}
