//! Texture catalog manager.
//!
//! The [`TextureManager`] owns the catalog (texture ID -> [`Texture`]) and
//! the storage root. It mirrors the catalog to `<root>/db.json`, refreshes it
//! from the remote asset service, and resolves texture keys to cached files,
//! downloading them on first use.
//!
//! [`Texture`]: crate::texture::Texture

mod texture_manager;

pub use texture_manager::{Rgba16Image, TextureManager, CATALOG_FILE};

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::{DownloadError, FetchError};
use crate::storage::StorageError;
use crate::texture::TextureError;

/// Errors returned by the texture manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// No catalog entry has this ID.
    #[error("Texture not found: {0}")]
    NotFound(String),

    /// The entry exists but lacks the requested map or resolution.
    #[error(transparent)]
    Unavailable(#[from] TextureError),

    /// The asset list could not be fetched; the catalog was left untouched.
    #[error("Could not fetch asset list from {url}")]
    AssetListUnavailable { url: String },

    /// A texture file could not be downloaded.
    #[error("Failed to download {key}")]
    Download {
        key: String,
        #[source]
        source: DownloadError,
    },

    /// The catalog file does not hold a JSON object.
    #[error("Catalog file {path} is not a JSON object")]
    InvalidCatalog { path: PathBuf },

    /// Reading or writing a JSON file failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Creating the storage directory failed.
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cached texture could not be decoded.
    #[error("Failed to decode {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    /// The fetcher could not be created.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// How much of a catalog entry is cached locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Metadata only, no texture file on disk.
    Listed,
    /// Some available files are on disk.
    PartiallyCached,
    /// Every available file is on disk.
    FullyCached,
}

/// Summary of one refresh from the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Assets in the remote list.
    pub listed: usize,
    /// Entries inserted for the first time.
    pub added: usize,
    /// Existing entries replaced.
    pub updated: usize,
    /// IDs whose population failed and were skipped.
    pub failed: Vec<String>,
}

impl RefreshReport {
    /// Number of entries inserted or replaced.
    pub fn succeeded(&self) -> usize {
        self.added + self.updated
    }
}
