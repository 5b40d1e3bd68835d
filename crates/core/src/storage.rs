//! JSON file helpers and atomic writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{trace, warn};

/// Errors from reading or writing JSON files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Writes `bytes` to `path` so that `path` either keeps its previous
/// content or holds the complete new content.
///
/// The data goes to a sibling `.part` file which is then renamed over the
/// destination. The parent directory must already exist.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let partial = partial_path(path);

    let result = fs::File::create(&partial).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    let result = result.and_then(|()| fs::rename(&partial, path));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Reads and parses a JSON file.
pub fn read_json_file(path: &Path) -> Result<Value, StorageError> {
    let content = fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_json::from_slice(&content).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    trace!("JSON successfully loaded from {}", path.display());
    Ok(value)
}

/// Writes `value` to `path` as pretty-printed JSON.
///
/// With `merge`, an existing parseable file is merge-patched (RFC 7396)
/// with `value`, so keys written by other components survive. An existing
/// file that cannot be parsed is overwritten.
pub fn write_json_file(path: &Path, value: &Value, merge: bool) -> Result<(), StorageError> {
    let mut output = value.clone();

    if merge && path.exists() {
        match read_json_file(path) {
            Ok(mut existing) => {
                merge_patch(&mut existing, value);
                output = existing;
                trace!("Merged JSON with existing content in {}", path.display());
            }
            Err(e) => {
                warn!("Could not parse existing JSON ({}), overwriting instead", e);
            }
        }
    }

    let rendered = serde_json::to_vec_pretty(&output).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    write_atomic(path, &rendered).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    trace!("JSON successfully written to {}", path.display());
    Ok(())
}

/// Applies a JSON merge patch to `target`.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }

    if let Value::Object(target_map) = target {
        for (key, patch_value) in patch_map {
            if patch_value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    patch_value,
                );
            }
        }
    }
}
