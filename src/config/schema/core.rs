use super::{LoggingConfig, ObservabilityConfig};
use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_STATE_FILE: &str = "operation-state.json";
const DEFAULT_LOCAL_STATE_FILE: &str = "resolver-state.json";

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniterConfig {
    /// Path to config.toml - computed on load, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Unit driven by this agent, e.g. "mysql/0"
    pub unit: String,
    /// Directory holding the persisted operation state
    pub state_dir: PathBuf,
    /// File name of the persisted operation state inside `state_dir`
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// File name of the handled relations and actions inside `state_dir`
    #[serde(default = "default_local_state_file")]
    pub local_state_file: String,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE.into()
}

fn default_local_state_file() -> String {
    DEFAULT_LOCAL_STATE_FILE.into()
}

fn charmloop_dir() -> PathBuf {
    let home = UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
    home.join(".charmloop")
}

impl Default for UniterConfig {
    fn default() -> Self {
        let base = charmloop_dir();
        Self {
            config_path: base.join("config.toml"),
            unit: "unit/0".into(),
            state_dir: base.join("state"),
            state_file: default_state_file(),
            local_state_file: default_local_state_file(),
            observability: ObservabilityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl UniterConfig {
    /// Parse and validate the config at `path`.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigError::Load(format!("failed to read config at {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&contents).map_err(|e| {
            ConfigError::Load(format!("failed to parse config at {}: {e}", path.display()))
        })?;
        config.config_path = path.to_path_buf();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load `~/.charmloop/config.toml` if present, otherwise defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = charmloop_dir().join("config.toml");
        if path.exists() {
            return Self::load_from_path(&path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(unit) = std::env::var("CHARMLOOP_UNIT")
            && !unit.is_empty()
        {
            self.unit = unit;
        }

        if let Ok(dir) = std::env::var("CHARMLOOP_STATE_DIR")
            && !dir.is_empty()
        {
            self.state_dir = PathBuf::from(dir);
        }

        if let Ok(level) = std::env::var("CHARMLOOP_LOG")
            && !level.is_empty()
        {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_name(&self.unit)?;

        validate_file_name("state_file", &self.state_file)?;
        validate_file_name("local_state_file", &self.local_state_file)?;
        if self.state_file == self.local_state_file {
            return Err(ConfigError::Validation(
                "state_file and local_state_file must differ".into(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "unknown logging level {other:?}"
            ))),
        }
    }

    pub fn state_file_path(&self) -> PathBuf {
        self.state_dir.join(&self.state_file)
    }

    pub fn local_state_file_path(&self) -> PathBuf {
        self.state_dir.join(&self.local_state_file)
    }
}

fn validate_file_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} must not be empty")));
    }
    if Path::new(name).components().count() != 1 {
        return Err(ConfigError::Validation(format!(
            "{field} must be a bare file name, got {name:?}"
        )));
    }
    Ok(())
}

/// Unit names are `<application>/<number>`.
fn validate_unit_name(unit: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("invalid unit name {unit:?}"));
    let (app, number) = unit.split_once('/').ok_or_else(invalid)?;
    if app.is_empty()
        || !app
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        || !app.starts_with(|c: char| c.is_ascii_lowercase())
    {
        return Err(invalid());
    }
    number.parse::<u32>().map_err(|_| invalid())?;
    Ok(())
}
