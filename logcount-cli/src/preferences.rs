use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Overrides the preferences location (used by tests and portable installs)
pub const PREFERENCES_ENV: &str = "LOGCOUNT_PREFERENCES";

/// Values remembered between invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Directory of the last analysed file
    #[serde(default)]
    pub last_open_dir: Option<PathBuf>,
    /// Last filter list loaded or saved
    #[serde(default)]
    pub last_filter_file: Option<PathBuf>,
}

impl Preferences {
    /// `$LOGCOUNT_PREFERENCES`, else `<config dir>/logcount/preferences.json`
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(PREFERENCES_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("logcount/preferences.json"))
    }

    /// Loads preferences, falling back to defaults when the file is missing or unreadable
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring malformed preferences {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                debug!("No preferences at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Remembers the directory containing `file`
    pub fn remember_file(&mut self, file: &Path) {
        let dir = file
            .canonicalize()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));
        if dir.is_some() {
            self.last_open_dir = dir;
        }
    }

    /// Resolves a relative `file` missing from the working directory against
    /// the last directory a file was analysed in. Returns `None` when no such
    /// fallback exists.
    pub fn fallback_for(&self, file: &Path) -> Option<PathBuf> {
        if file.is_absolute() || file.exists() {
            return None;
        }
        let candidate = self.last_open_dir.as_ref()?.join(file);
        candidate.is_file().then_some(candidate)
    }

    pub fn remember_filter_file(&mut self, file: &Path) {
        self.last_filter_file = Some(file.canonicalize().unwrap_or_else(|_| file.to_path_buf()));
    }
}
