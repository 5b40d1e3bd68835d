//! Thumbnail cache: one resized PNG per texture under the storage root.

use std::io::Cursor;
use std::path::PathBuf;

use image::ImageFormat;
use tracing::{debug, trace, warn};

use super::PopulateError;
use crate::config::ThumbnailConfig;
use crate::fetch::Fetcher;
use crate::storage;

/// Location and size of cached thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    root: PathBuf,
    width: u32,
    height: u32,
}

impl ThumbnailCache {
    pub fn new(root: impl Into<PathBuf>, config: &ThumbnailConfig) -> Self {
        Self {
            root: root.into(),
            width: config.width,
            height: config.height,
        }
    }

    /// Cached thumbnail path of a texture, `<root>/<id>_thumbnail.png`.
    pub fn path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}_thumbnail.png", id))
    }

    /// Makes sure the thumbnail of `id` is cached, fetching it if needed.
    pub fn ensure(&self, fetcher: &Fetcher, id: &str, url: &str) -> Result<PathBuf, PopulateError> {
        let path = self.path(id);
        if path.exists() {
            match image::open(&path) {
                Ok(_) => {
                    trace!("Thumbnail already cached: {}", path.display());
                    return Ok(path);
                }
                Err(e) => warn!("Refetching unreadable thumbnail {}: {}", path.display(), e),
            }
        }

        let image = fetcher
            .fetch_image(url, fetcher.timeout())
            .ok_or_else(|| PopulateError::ThumbnailUnavailable {
                id: id.to_string(),
                url: url.to_string(),
            })?;

        let thumbnail = image.thumbnail(self.width, self.height);
        let mut encoded = Vec::new();
        thumbnail
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| PopulateError::ThumbnailWrite {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        storage::write_atomic(&path, &encoded).map_err(|e| PopulateError::ThumbnailWrite {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        debug!(
            "Cached thumbnail {}x{} -> {}",
            thumbnail.width(),
            thumbnail.height(),
            path.display()
        );
        Ok(path)
    }
}
