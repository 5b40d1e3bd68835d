//! Blocking fetcher racing each request against a deadline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::DynamicImage;
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};
use tracing::{trace, warn};

use super::{FetchError, HttpTransport, Transport};
use crate::config::FetchConfig;

/// Blocking fetch front-end over an async [`Transport`].
///
/// Owns a single-threaded tokio runtime; every call blocks the caller until
/// the request completes or its deadline elapses. Must not be called from
/// inside another async runtime.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    runtime: Runtime,
    timeout: Duration,
    download_timeout: Duration,
    path_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Fetcher {
    /// Create a fetcher over the given transport.
    pub fn new(transport: Arc<dyn Transport>, config: &FetchConfig) -> Result<Self, FetchError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FetchError::Runtime)?;

        Ok(Self {
            transport,
            runtime,
            timeout: config.timeout(),
            download_timeout: config.download_timeout(),
            path_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Create a fetcher backed by [`HttpTransport`].
    pub fn http(config: &FetchConfig) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(config)?;
        Self::new(Arc::new(transport), config)
    }

    /// Default deadline for JSON and image fetches.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deadline applied by [`Fetcher::download`].
    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    /// Name of the underlying transport.
    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Issues one GET and waits at most `timeout` for the body.
    ///
    /// When the deadline wins, the request future is dropped before this
    /// returns, so a late response can never be observed by a later call.
    pub fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        trace!("fetch: {} (timeout {:?})", url, timeout);

        let request = self.transport.get(url);
        match self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, request).await })
        {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!("Fetch timed out after {:?}: {}", timeout, url);
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                })
            }
        }
    }

    /// Fetches and parses a JSON document.
    ///
    /// Returns `None` on any fetch or parse failure, and also when the
    /// document is empty (`null`, `{}` or `[]`): callers cannot tell an empty
    /// remote document from a failed fetch.
    pub fn fetch_json(&self, url: &str, timeout: Duration) -> Option<Value> {
        let bytes = match self.fetch(url, timeout) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("JSON fetch failed: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) if is_empty_document(&value) => {
                warn!("JSON fetch returned an empty document: {}", url);
                None
            }
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to parse JSON from {}: {}", url, e);
                None
            }
        }
    }

    /// Fetches and decodes a raster image, `None` on any failure.
    pub fn fetch_image(&self, url: &str, timeout: Duration) -> Option<DynamicImage> {
        let bytes = match self.fetch(url, timeout) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Image fetch failed: {}", e);
                return None;
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Failed to decode image from {}: {}", url, e);
                None
            }
        }
    }

    /// Returns the lock guarding downloads into `path`.
    pub(super) fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .path_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Hands back a lock taken with [`Fetcher::path_lock`], forgetting the
    /// path once no caller holds its lock.
    pub(super) fn release_path_lock(&self, path: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .path_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if locks
            .get(path)
            .is_some_and(|held| Arc::strong_count(held) == 1)
        {
            locks.remove(path);
        }
    }

    #[cfg(test)]
    pub(super) fn tracked_paths(&self) -> usize {
        self.path_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
