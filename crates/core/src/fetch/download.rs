//! File download on top of the scalar fetch.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, trace};

use super::{FetchError, Fetcher};
use crate::storage;

/// Result of a successful download call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was fetched and written.
    Downloaded { bytes: u64 },
    /// The destination already existed and overwrite was disabled.
    Skipped,
}

/// Errors that can occur while downloading a file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Fetching the remote file failed; the destination was not touched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Writing the destination failed; no partial file is left behind.
    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Fetcher {
    /// Downloads `url` into `dest`.
    ///
    /// With `overwrite == false` an existing destination is left alone and
    /// no request is made. The file only appears at `dest` once it has been
    /// written completely.
    pub fn download(
        &self,
        url: &str,
        dest: &Path,
        overwrite: bool,
    ) -> Result<DownloadOutcome, DownloadError> {
        let lock = self.path_lock(dest);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.download_locked(url, dest, overwrite)
        };
        self.release_path_lock(dest, lock);
        result
    }

    fn download_locked(
        &self,
        url: &str,
        dest: &Path,
        overwrite: bool,
    ) -> Result<DownloadOutcome, DownloadError> {
        if dest.exists() && !overwrite {
            trace!("download: file already exists, skipping: {}", dest.display());
            return Ok(DownloadOutcome::Skipped);
        }

        let bytes = self.fetch(url, self.download_timeout()).map_err(|e| {
            error!("download: fetch error: {}", e);
            e
        })?;

        storage::write_atomic(dest, &bytes).map_err(|source| {
            error!("download: error writing file {}: {}", dest.display(), source);
            DownloadError::Io {
                path: dest.to_path_buf(),
                source,
            }
        })?;

        debug!("Downloaded {} ({} bytes) -> {}", url, bytes.len(), dest.display());
        Ok(DownloadOutcome::Downloaded {
            bytes: bytes.len() as u64,
        })
    }
}
