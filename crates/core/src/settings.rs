//! User settings persisted between runs.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::storage::{self, StorageError};
use crate::texture::json_safe_get;

/// Relative storage root used when nothing else is known.
pub const FALLBACK_STORAGE_DIR: &str = "texture_downloader";

/// Settings remembered across sessions.
///
/// Stored in a JSON file shared with other components; saving merges into
/// the existing file rather than replacing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub last_storage_path: Option<PathBuf>,
}

impl Settings {
    /// Loads settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Self::default();
        }

        match storage::read_json_file(path) {
            Ok(json) => {
                let mut settings = Self::default();
                json_safe_get(&json, "last_storage_path", &mut settings.last_storage_path);
                settings
            }
            Err(e) => {
                warn!("Ignoring unreadable settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Merges these settings into the file at `path`, creating its parent
    /// directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let value = match &self.last_storage_path {
            Some(p) => serde_json::json!({ "last_storage_path": p.to_string_lossy() }),
            None => serde_json::json!({ "last_storage_path": Value::Null }),
        };
        storage::write_json_file(path, &value, true)
    }
}

/// Picks the storage root: the explicit path, then the last used one, then
/// the platform data directory, then [`FALLBACK_STORAGE_DIR`].
pub fn resolve_storage_path(explicit: Option<&Path>, settings: &Settings) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = &settings.last_storage_path {
        return path.clone();
    }
    dirs::data_dir()
        .map(|dir| dir.join("texvault"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_STORAGE_DIR))
}
