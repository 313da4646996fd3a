//! JSON state-file store.
//!
//! The whole run state is one JSON document, replaced atomically on every
//! save (write a temp file in the same directory, then rename), so a crash
//! mid-write can never tear the file. A prior file that is missing,
//! unreadable, corrupt, or from another layout version starts a fresh run
//! with a logged warning, never a fatal error.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pictor_core::error::AppError;
use pictor_core::state::{RunState, STATE_VERSION};
use pictor_core::traits::StateStore;

pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<RunState, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RunState::new());
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "State file unreadable, starting fresh"
                );
                return Ok(RunState::new());
            }
        };

        match serde_json::from_str::<RunState>(&raw) {
            Ok(state) if state.version == STATE_VERSION => Ok(state),
            Ok(state) => {
                tracing::warn!(
                    path = %self.path.display(),
                    found = state.version,
                    expected = STATE_VERSION,
                    "State file has an unknown version, starting fresh"
                );
                Ok(RunState::new())
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "State file corrupt, starting fresh"
                );
                Ok(RunState::new())
            }
        }
    }

    fn save(&self, state: &RunState) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(state)?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| AppError::State(format!("creating temp file in {}: {e}", dir.display())))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| AppError::State(format!("writing state: {e}")))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| AppError::State(format!("syncing state: {e}")))?;
        tmp.persist(&self.path)
            .map_err(|e| AppError::State(format!("replacing {}: {e}", self.path.display())))?;

        Ok(())
    }
}
