use super::charmdir::update_charm_dir;
use super::forward::Forwarder;
use super::local::{LocalStateFile, SharedLocalState, lock};
use super::{NextOp, Resolver, ResolverOpFactory};
use crate::error::{LoopError, ResolverError};
use crate::fortress::Guard;
use crate::observability::{LoopEvent, Observer};
use crate::operation::{Executor, Factory, Operation, State};
use crate::remotestate::{Snapshot, Watcher};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Called when the unit settles with nothing left to do.
pub type IdleCallback = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Collaborators driven by [`run_loop`].
pub struct LoopConfig {
    pub resolver: Arc<dyn Resolver>,
    pub watcher: Arc<dyn Watcher>,
    pub executor: Arc<dyn Executor>,
    pub factory: Arc<dyn Factory>,
    pub abort: CancellationToken,
    pub on_idle: Option<IdleCallback>,
    pub charm_dir_guard: Arc<dyn Guard>,
    pub observer: Arc<dyn Observer>,
    /// Where handled relations and actions are saved, if anywhere.
    pub local_state_file: Option<LocalStateFile>,
}

/// How a round of decisions ended.
enum Settled {
    Idle,
    Waiting,
}

/// Drive the unit until `config.abort` fires or something fails.
///
/// Each round takes the latest remote snapshot, runs operations one at a
/// time for as long as the resolver asks for them, then waits for abort,
/// a remote change, or a change seen while an operation was running. Abort
/// always wins over pending changes.
pub async fn run_loop(config: &LoopConfig, local: &SharedLocalState) -> Result<(), LoopError> {
    let fire = Arc::new(Notify::new());
    let mut idle = false;

    // The guard may be stale if the agent restarted mid-operation.
    let state = config.executor.state();
    update_charm_dir(
        &state,
        config.charm_dir_guard.as_ref(),
        &config.abort,
        config.observer.as_ref(),
    )
    .await?;

    loop {
        match resolve(config, local, &fire).await? {
            (Settled::Waiting, _) => {
                idle = false;
                tracing::debug!("waiting for remote state");
                config.observer.record_event(&LoopEvent::Waiting);
            }
            (Settled::Idle, ran) => {
                if ran {
                    idle = false;
                }
                if !idle {
                    idle = true;
                    tracing::debug!("unit idle");
                    config.observer.record_event(&LoopEvent::Idle);
                    if let Some(on_idle) = &config.on_idle {
                        on_idle().map_err(LoopError::Idle)?;
                    }
                }
            }
        }

        tokio::select! {
            biased;
            () = config.abort.cancelled() => {
                tracing::debug!("resolver loop aborted");
                config.observer.record_event(&LoopEvent::Aborted);
                return Err(LoopError::Aborted);
            }
            () = config.watcher.changed() => {}
            () = fire.notified() => {}
        }
        config.observer.record_event(&LoopEvent::RemoteStateChanged {
            version: config.watcher.snapshot().version,
        });
    }
}

/// Ask the resolver for operations until it has none. Reports whether any
/// operation ran.
async fn resolve(
    config: &LoopConfig,
    local: &SharedLocalState,
    fire: &Arc<Notify>,
) -> Result<(Settled, bool), LoopError> {
    let mut remote = config.watcher.snapshot();
    refresh(config, local);

    let mut ran = false;
    loop {
        let op = match decide(config, local, &remote)? {
            NextOp::Run(op) => op,
            NextOp::NoOperation => return Ok((Settled::Idle, ran)),
            NextOp::Waiting => return Ok((Settled::Waiting, ran)),
            NextOp::DoNotProceed => return Err(LoopError::DoNotProceed),
        };
        ran = true;
        run_op(config, op, fire).await?;

        remote = config.watcher.snapshot();
        let state = refresh(config, local);
        update_charm_dir(
            &state,
            config.charm_dir_guard.as_ref(),
            &config.abort,
            config.observer.as_ref(),
        )
        .await?;
    }
}

fn decide(
    config: &LoopConfig,
    local: &SharedLocalState,
    remote: &Snapshot,
) -> Result<NextOp, ResolverError> {
    let mut factory = ResolverOpFactory::new(
        Arc::clone(&config.factory),
        Arc::clone(local),
        remote.clone(),
    );
    if let Some(store) = &config.local_state_file {
        factory = factory.persisting(store.clone());
    }
    let current = lock(local).clone();
    let next = config.resolver.next_op(&current, remote, &factory)?;
    tracing::trace!(next = ?next, remote_version = remote.version, "resolver decided");
    Ok(next)
}

fn refresh(config: &LoopConfig, local: &SharedLocalState) -> State {
    let state = config.executor.state();
    lock(local).state = state.clone();
    state
}

async fn run_op(
    config: &LoopConfig,
    op: Box<dyn Operation>,
    fire: &Arc<Notify>,
) -> Result<(), LoopError> {
    let name = op.to_string();
    tracing::info!(op = %name, "running operation");
    config
        .observer
        .record_event(&LoopEvent::OperationStarted { op: name.clone() });

    let started = Instant::now();
    let (forwarder, remote) = Forwarder::spawn(Arc::clone(&config.watcher), Arc::clone(fire));
    let result = config.executor.run(op, remote).await;
    forwarder.stop().await?;

    match result {
        Ok(()) => {
            config.observer.record_event(&LoopEvent::OperationCompleted {
                op: name,
                duration: started.elapsed(),
            });
            Ok(())
        }
        Err(e) => {
            config.observer.record_event(&LoopEvent::OperationFailed {
                op: name,
                error: e.to_string(),
            });
            Err(e.into())
        }
    }
}
