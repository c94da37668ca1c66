use crate::selection::SelectionMap;
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};

const SELECTION_FILE: &str = "selection.json";

/// `$XDG_STATE_HOME/dbw`, then `~/.local/state/dbw`, then the platform state dir.
pub fn state_dir() -> PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME").filter(|s| !s.is_empty()) {
        PathBuf::from(state).join("dbw")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state").join("dbw")
    } else if let Some(dir) = dirs::state_dir() {
        dir.join("dbw")
    } else {
        std::env::temp_dir().join("dbw")
    }
}

/// Persists the job selection between sessions as a flat JSON object.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SELECTION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing was ever saved. A corrupt file is logged and ignored so a
    /// bad write can't lock the user out of the dashboard.
    pub fn load(&self) -> Result<Option<SelectionMap>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(eyre!("Failed to read {}: {e}", self.path.display())),
        };
        match serde_json::from_str(&content) {
            Ok(map) => Ok(Some(map)),
            Err(e) => {
                tracing::warn!("ignoring corrupt selection file {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    pub fn save(&self, selection: &SelectionMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create {}: {e}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(selection)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| eyre!("Failed to write {}: {e}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| eyre!("Failed to replace {}: {e}", self.path.display()))?;
        tracing::debug!(
            "saved selection ({} of {} selected) to {}",
            selection.selected_count(),
            selection.len(),
            self.path.display()
        );
        Ok(())
    }
}
