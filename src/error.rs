use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `charmloop`.
///
/// Each subsystem defines its own error variant. Embedders can match on
/// these to decide whether to restart the loop; collaborator-supplied
/// failures (idle callbacks, hook runners, deployers) travel as
/// `anyhow::Error` inside the relevant variant.
#[derive(Debug, Error)]
pub enum CharmloopError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Resolver loop ───────────────────────────────────────────────────
    #[error("loop: {0}")]
    Loop(#[from] LoopError),

    // ── Executor / persisted state ──────────────────────────────────────
    #[error("executor: {0}")]
    Executor(#[from] ExecutorError),

    #[error("state: {0}")]
    State(#[from] StateError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Resolver loop errors ────────────────────────────────────────────────────

/// Reasons the resolver loop stops. Every variant except `Aborted` is a
/// failure; `NoOperation` and `Waiting` never surface here.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("resolver loop aborted")]
    Aborted,

    #[error("do not proceed")]
    DoNotProceed,

    #[error("resolver: {0}")]
    Resolver(#[from] ResolverError),

    #[error("executor: {0}")]
    Executor(#[from] ExecutorError),

    #[error("charm dir guard: {0}")]
    Guard(#[from] GuardError),

    #[error("idle callback failed: {0}")]
    Idle(#[source] anyhow::Error),

    #[error("remote state forwarder failed: {0}")]
    Forwarder(String),

    #[error("resolver loop task failed: {0}")]
    Task(String),
}

impl LoopError {
    /// True when the loop stopped because its abort token fired, either at
    /// the outer wait or while locking down the charm directory.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted | Self::Guard(GuardError::Aborted))
    }
}

// ─── Resolver errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("operation factory: {0}")]
    Factory(#[from] OperationError),

    #[error("unexpected local state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Operation errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("deploying charm {charm_url} failed: {message}")]
    Deploy { charm_url: String, message: String },

    #[error("hook {hook} failed: {message}")]
    Hook { hook: String, message: String },

    #[error("action {action_id} failed: {message}")]
    Action { action_id: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Executor errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("{phase} {op}: {source}")]
    Operation {
        phase: &'static str,
        op: String,
        #[source]
        source: OperationError,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

// ─── Persisted state errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid operation state: {0}")]
    Invalid(String),

    #[error("state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ─── Guard errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("fortress operation aborted")]
    Aborted,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CharmloopError>;
