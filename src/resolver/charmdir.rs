use crate::error::GuardError;
use crate::fortress::Guard;
use crate::observability::{LoopEvent, Observer};
use crate::operation::{Kind, State};
use tokio_util::sync::CancellationToken;

/// Whether hooks and other readers may use the charm directory in `state`.
///
/// The directory is off limits before the unit starts, after it stops, and
/// while charm content is being written or the upgrade-charm hook runs.
pub fn charm_dir_available(state: &State) -> bool {
    let changing = match state.kind {
        Kind::Install | Kind::Upgrade => true,
        Kind::RunHook => state.hook.as_ref().is_some_and(|h| h.kind.is_upgrade_charm()),
        Kind::None | Kind::RunAction | Kind::Continue => false,
    };
    state.started && !state.stopped && !changing
}

/// Apply the availability derived from `state` to `guard`.
pub async fn update_charm_dir(
    state: &State,
    guard: &dyn Guard,
    abort: &CancellationToken,
    observer: &dyn Observer,
) -> Result<bool, GuardError> {
    let available = charm_dir_available(state);
    tracing::trace!(available, state = %state, "charm dir availability");
    if available {
        guard.unlock().await?;
    } else {
        guard.lockdown(abort).await?;
    }
    observer.record_event(&LoopEvent::CharmDir { available });
    Ok(available)
}
