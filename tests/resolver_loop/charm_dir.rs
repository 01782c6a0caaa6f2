use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use charmloop::operation::{HookKind, Kind, State, Step};
use charmloop::{Executor, Snapshot};

use super::unit_harness::{CHARM, RecordingRunner, Unit, eventually, seed_state, unit_config};

fn running_unit(runner: RecordingRunner) -> Unit {
    let dir = TempDir::new().unwrap();
    seed_state(
        &unit_config(&dir),
        &State {
            kind: Kind::Continue,
            step: Step::Pending,
            charm_url: Some(CHARM.into()),
            installed: true,
            started: true,
            ..State::default()
        },
    );
    Unit::new(dir, Snapshot::with_charm_url(CHARM), runner)
}

#[tokio::test]
async fn readers_wait_out_a_charm_upgrade() {
    let gate = Arc::new(Notify::new());
    let unit = running_unit(RecordingRunner {
        hook_gate: Some((HookKind::UpgradeCharm, Arc::clone(&gate))),
        ..RecordingRunner::default()
    });
    let worker = unit.start();
    let abort = CancellationToken::new();

    eventually("unit to settle", || unit.idle_calls() == 1).await;
    let read = unit.fortress.visit(&abort, || async { "metadata" }).await;
    assert_eq!(read, Ok("metadata"));

    unit.watcher
        .update(|s| s.charm_url = Some("ch:wordpress-13".into()));
    eventually("charm dir lockdown", || !unit.fortress.is_unlocked()).await;

    let reader = {
        let fortress = Arc::clone(&unit.fortress);
        let abort = abort.clone();
        tokio::spawn(async move { fortress.visit(&abort, || async { "metadata" }).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!reader.is_finished());

    gate.notify_one();
    let read = tokio::time::timeout(Duration::from_secs(5), reader)
        .await
        .expect("reader should get in after the upgrade")
        .unwrap();
    assert_eq!(read, Ok("metadata"));

    eventually("unit to settle again", || unit.idle_calls() == 2).await;
    assert_eq!(unit.runner.deploys(), ["upgrade ch:wordpress-13"]);
    assert_eq!(unit.runner.hooks(), ["upgrade-charm"]);

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn stopping_unit_closes_charm_dir() {
    let unit = running_unit(RecordingRunner::default());
    let worker = unit.start();

    eventually("unit to settle", || unit.idle_calls() == 1).await;
    assert!(unit.fortress.is_unlocked());

    unit.watcher.update(|s| s.life = charmloop::remotestate::Life::Dying);
    eventually("stop hook", || unit.idle_calls() == 2).await;

    assert_eq!(unit.runner.hooks(), ["stop"]);
    assert!(unit.executor.state().stopped);
    assert!(!unit.fortress.is_unlocked());

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn stop_aborts_a_blocked_lockdown() {
    let unit = running_unit(RecordingRunner::default());
    let worker = unit.start();
    eventually("unit to settle", || unit.idle_calls() == 1).await;

    // A reader that never leaves keeps the next lockdown waiting.
    let release = Arc::new(Notify::new());
    let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
    let reader = {
        let fortress = Arc::clone(&unit.fortress);
        let release = Arc::clone(&release);
        tokio::spawn(async move {
            fortress
                .visit(&CancellationToken::new(), || async move {
                    let _ = entered_tx.send(());
                    release.notified().await;
                })
                .await
        })
    };
    entered_rx.await.unwrap();

    unit.watcher.update(|s| s.life = charmloop::remotestate::Life::Dying);
    eventually("lockdown to start", || !unit.fortress.is_unlocked()).await;

    tokio::time::timeout(Duration::from_secs(5), worker.stop())
        .await
        .expect("stop should not wait for the reader")
        .unwrap();

    release.notify_one();
    reader.await.unwrap().unwrap();
}
