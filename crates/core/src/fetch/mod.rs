//! Bounded, blocking fetch primitives.
//!
//! A [`Fetcher`] issues exactly one GET per call against a [`Transport`] and
//! races it against a deadline. Callers block until the response arrives or
//! the deadline elapses; in the latter case the in-flight request is dropped
//! and [`FetchError::Timeout`] is returned.
//!
//! On top of the scalar [`Fetcher::fetch`] sit two typed wrappers
//! ([`Fetcher::fetch_json`], [`Fetcher::fetch_image`]) that report any
//! failure as an empty result, and [`Fetcher::download`], which persists the
//! bytes to a destination path with an overwrite/skip policy.

mod download;
mod fetcher;
mod http;

pub use download::{DownloadError, DownloadOutcome};
pub use fetcher::Fetcher;
pub use http::HttpTransport;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching a remote resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, DNS, reset, body read).
    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The request did not complete before its deadline.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The blocking runtime could not be created.
    #[error("Failed to start fetch runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl FetchError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error was caused by the deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this error is a network-class failure (transport or status).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Status { .. })
    }
}

/// Something that can perform a single GET and return the body bytes.
///
/// Implementations must not retry and should not impose their own timeout;
/// the deadline is owned by [`Fetcher`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the name of this transport implementation.
    fn name(&self) -> &str;

    /// Performs one GET request.
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
