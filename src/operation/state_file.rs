use super::State;
use crate::error::StateError;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON file holding the unit's operation [`State`].
///
/// Writes replace the file atomically so a crash mid-write leaves the
/// previous state intact.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state, or `None` if nothing was ever written.
    pub fn read(&self) -> Result<Option<State>, StateError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let state: State = serde_json::from_str(&raw).map_err(|source| StateError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;
        state.validate()?;
        Ok(Some(state))
    }

    pub fn write(&self, state: &State) -> Result<(), StateError> {
        state.validate()?;
        let json = serde_json::to_string_pretty(state).map_err(|source| StateError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;
        write_atomic(&self.path, &json).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;

    if let Err(rename_error) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(rename_error);
    }

    Ok(())
}
