#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use charmloop::config::UniterConfig;
use charmloop::observability::create_observer;
use charmloop::operation::{Deployer, HookInfo, HookKind, HookRunner, State, StateFile};
use charmloop::resolver::{LocalState, LocalStateFile, LoopConfig, SharedLocalState};
use charmloop::{
    Executor, Fortress, OperationFactory, Snapshot, SnapshotWatcher, StateExecutor,
    UniterResolver, UniterWorker,
};
use tokio_util::sync::CancellationToken;

pub const CHARM: &str = "ch:wordpress-12";

/// Deployer and hook runner that records what it was asked to do.
#[derive(Default)]
pub struct RecordingRunner {
    pub deploys: Mutex<Vec<String>>,
    pub hooks: Mutex<Vec<String>>,
    pub actions: Mutex<Vec<String>>,
    /// When set, deploys wait for one notification each.
    pub deploy_gate: Option<Arc<Notify>>,
    /// When set, the named hook waits for one notification before running.
    pub hook_gate: Option<(HookKind, Arc<Notify>)>,
}

impl RecordingRunner {
    pub fn hooks(&self) -> Vec<String> {
        self.hooks.lock().unwrap().clone()
    }

    pub fn deploys(&self) -> Vec<String> {
        self.deploys.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Deployer for RecordingRunner {
    async fn deploy(&self, charm_url: &str, upgrade: bool) -> anyhow::Result<()> {
        if let Some(gate) = &self.deploy_gate {
            gate.notified().await;
        }
        let entry = if upgrade {
            format!("upgrade {charm_url}")
        } else {
            format!("install {charm_url}")
        };
        self.deploys.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait]
impl HookRunner for RecordingRunner {
    async fn run_hook(&self, hook: &HookInfo) -> anyhow::Result<()> {
        if let Some((kind, gate)) = &self.hook_gate
            && *kind == hook.kind
        {
            gate.notified().await;
        }
        self.hooks.lock().unwrap().push(hook.to_string());
        Ok(())
    }

    async fn run_action(&self, action_id: &str) -> anyhow::Result<()> {
        self.actions.lock().unwrap().push(action_id.to_string());
        Ok(())
    }
}

/// One unit's worth of collaborators backed by a temporary state directory.
pub struct Unit {
    pub dir: TempDir,
    pub config: UniterConfig,
    pub watcher: Arc<SnapshotWatcher>,
    pub executor: Arc<StateExecutor>,
    pub fortress: Arc<Fortress>,
    pub runner: Arc<RecordingRunner>,
    pub idle_calls: Arc<AtomicUsize>,
    pub local: SharedLocalState,
}

pub fn unit_config(dir: &TempDir) -> UniterConfig {
    UniterConfig {
        unit: "wordpress/0".into(),
        state_dir: dir.path().join("state"),
        ..UniterConfig::default()
    }
}

/// Persist `state` as if a previous agent run had left it behind.
pub fn seed_state(config: &UniterConfig, state: &State) {
    StateFile::new(config.state_file_path()).write(state).unwrap();
}

impl Unit {
    pub fn new(dir: TempDir, remote: Snapshot, runner: RecordingRunner) -> Self {
        Self::with_local(dir, remote, runner, |_| {})
    }

    pub fn with_local(
        dir: TempDir,
        remote: Snapshot,
        runner: RecordingRunner,
        seed: impl FnOnce(&mut LocalState),
    ) -> Self {
        let config = unit_config(&dir);
        config.validate().unwrap();
        let executor = Arc::new(StateExecutor::from_config(&config).unwrap());
        let mut local = LocalStateFile::new(config.local_state_file_path())
            .load(executor.state())
            .unwrap();
        seed(&mut local);

        Self {
            dir,
            config,
            watcher: Arc::new(SnapshotWatcher::new(remote)),
            executor,
            fortress: Arc::new(Fortress::new()),
            runner: Arc::new(runner),
            idle_calls: Arc::new(AtomicUsize::new(0)),
            local: local.shared(),
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        let idle_calls = Arc::clone(&self.idle_calls);
        LoopConfig {
            resolver: Arc::new(UniterResolver::new()),
            watcher: self.watcher.clone(),
            executor: self.executor.clone(),
            factory: Arc::new(OperationFactory::new(
                self.runner.clone(),
                self.runner.clone(),
            )),
            abort: CancellationToken::new(),
            on_idle: Some(Box::new(move || -> anyhow::Result<()> {
                idle_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
            charm_dir_guard: self.fortress.clone(),
            observer: Arc::from(create_observer(
                &self.config.observability,
                &self.config.unit,
            )),
            local_state_file: Some(LocalStateFile::new(self.config.local_state_file_path())),
        }
    }

    pub fn start(&self) -> UniterWorker {
        UniterWorker::spawn(self.loop_config(), Arc::clone(&self.local))
    }

    pub fn idle_calls(&self) -> usize {
        self.idle_calls.load(Ordering::SeqCst)
    }
}

pub async fn eventually(what: &str, cond: impl Fn() -> bool) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {what}");
}
