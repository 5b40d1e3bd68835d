use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgba};
use serde_json::{Map, Value};
use tracing::{debug, error, info, trace, warn};

use super::{CacheState, ManagerError, RefreshReport};
use crate::config::{Config, ThumbnailConfig};
use crate::fetch::Fetcher;
use crate::storage;
use crate::texture::{
    RemoteSource, Texture, TextureError, TextureKey, TextureResolution, TextureType,
    ThumbnailCache,
};

/// Name of the catalog file under the storage root.
pub const CATALOG_FILE: &str = "db.json";

/// 16-bit RGBA pixels of a decoded texture.
pub type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;

/// Owns the texture catalog and its storage root.
///
/// A single manager is assumed to be the only writer of its storage root.
pub struct TextureManager {
    storage_path: PathBuf,
    textures: BTreeMap<String, Texture>,
    fetcher: Fetcher,
    remote: RemoteSource,
    thumbnails: ThumbnailCache,
    thumbnail_config: ThumbnailConfig,
}

impl TextureManager {
    /// Create a manager fetching over HTTP.
    pub fn new(config: &Config, storage_path: impl Into<PathBuf>) -> Result<Self, ManagerError> {
        let fetcher = Fetcher::http(&config.fetch)?;
        Self::with_fetcher(config, storage_path, fetcher)
    }

    /// Create a manager over an existing fetcher.
    ///
    /// The storage directory is created if it does not exist. The catalog
    /// starts empty; call [`TextureManager::load`] to read it.
    pub fn with_fetcher(
        config: &Config,
        storage_path: impl Into<PathBuf>,
        fetcher: Fetcher,
    ) -> Result<Self, ManagerError> {
        let storage_path = storage_path.into();
        ensure_dir(&storage_path)?;
        info!(
            "Texture manager at {} ({} transport)",
            storage_path.display(),
            fetcher.transport_name()
        );

        Ok(Self {
            thumbnails: ThumbnailCache::new(&storage_path, &config.thumbnail),
            thumbnail_config: config.thumbnail,
            storage_path,
            textures: BTreeMap::new(),
            fetcher,
            remote: RemoteSource::new(&config.remote),
        })
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.storage_path.join(CATALOG_FILE)
    }

    pub fn remote(&self) -> &RemoteSource {
        &self.remote
    }

    // =========================================================================
    // Catalog access
    // =========================================================================

    /// Current catalog, keyed by texture ID.
    pub fn textures(&self) -> &BTreeMap<String, Texture> {
        &self.textures
    }

    pub fn get(&self, id: &str) -> Option<&Texture> {
        self.textures.get(id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Pinned entries, in ID order.
    pub fn pinned(&self) -> impl Iterator<Item = &Texture> {
        self.textures.values().filter(|t| t.is_pinned())
    }

    /// Sets the pin flag of one entry.
    pub fn set_pinned(&mut self, id: &str, pinned: bool) -> Result<(), ManagerError> {
        let texture = self
            .textures
            .get_mut(id)
            .ok_or_else(|| ManagerError::NotFound(id.to_string()))?;
        texture.set_pinned(pinned);
        Ok(())
    }

    /// Drops every in-memory entry. The catalog file is only affected by a
    /// later [`TextureManager::save`].
    pub fn clear(&mut self) {
        self.textures.clear();
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Replaces the in-memory catalog with the content of `db.json`.
    ///
    /// A missing file yields an empty catalog. A malformed file is an error
    /// and leaves the in-memory catalog as it was.
    pub fn load(&mut self) -> Result<(), ManagerError> {
        self.textures = read_catalog(&self.catalog_path())?;
        Ok(())
    }

    /// Writes the whole catalog to `db.json`, replacing its content.
    pub fn save(&self) -> Result<(), ManagerError> {
        let path = self.catalog_path();
        let json: Map<String, Value> = self
            .textures
            .iter()
            .map(|(id, texture)| (id.clone(), texture.to_json()))
            .collect();

        storage::write_json_file(&path, &Value::Object(json), false)?;
        debug!("Saved {} textures to {}", self.textures.len(), path.display());
        Ok(())
    }

    // =========================================================================
    // Remote refresh
    // =========================================================================

    /// Refreshes the catalog from the remote asset list.
    ///
    /// If the asset list cannot be fetched the catalog is left untouched.
    /// Otherwise every listed asset is populated in turn and inserted or
    /// replaced, keeping its pin flag; assets that fail to populate are
    /// skipped. Entries missing from the remote list are kept.
    pub fn refresh_from_remote(&mut self) -> Result<RefreshReport, ManagerError> {
        trace!("TextureManager::refresh_from_remote");

        let url = self.remote.asset_list_url();
        let Some(asset_list) = self.fetcher.fetch_json(&url, self.fetcher.timeout()) else {
            error!("Could not fetch asset list from {}", url);
            return Err(ManagerError::AssetListUnavailable { url });
        };
        let Some(assets) = asset_list.as_object() else {
            error!("Asset list from {} is not a JSON object", url);
            return Err(ManagerError::AssetListUnavailable { url });
        };

        let mut report = RefreshReport {
            listed: assets.len(),
            ..RefreshReport::default()
        };

        for source_native_id in assets.keys() {
            let id = self.remote.local_id(source_native_id);
            info!("Refreshing texture {}", id);

            let mut texture = Texture::new(id.clone());
            if let Err(e) = texture.populate_from_remote(
                source_native_id,
                &asset_list,
                &self.fetcher,
                &self.remote,
                &self.thumbnails,
            ) {
                warn!("Skipping texture {}: {}", id, e);
                report.failed.push(id);
                continue;
            }

            match self.textures.get(&id) {
                Some(previous) => {
                    texture.set_pinned(previous.is_pinned());
                    report.updated += 1;
                }
                None => report.added += 1,
            }
            self.textures.insert(id, texture);
        }

        info!(
            "Refresh complete: {} listed, {} added, {} updated, {} failed",
            report.listed,
            report.added,
            report.updated,
            report.failed.len()
        );
        Ok(report)
    }

    // =========================================================================
    // Download cache
    // =========================================================================

    /// Cache file of one texture, `<root>/<key>.png`.
    pub fn texture_path(&self, key: &TextureKey) -> PathBuf {
        self.storage_path.join(key.file_name())
    }

    /// Cached thumbnail of one texture.
    pub fn thumbnail_path(&self, id: &str) -> PathBuf {
        self.thumbnails.path(id)
    }

    /// Resolves `key` to its cached file, downloading it if absent or if
    /// `force` is set.
    ///
    /// The returned path always exists.
    pub fn resolve_and_download(
        &self,
        key: &TextureKey,
        force: bool,
    ) -> Result<PathBuf, ManagerError> {
        let texture = self
            .textures
            .get(&key.id)
            .ok_or_else(|| ManagerError::NotFound(key.id.clone()))?;

        if !texture.has_texture(key.texture_type, key.resolution) {
            return Err(TextureError::Unavailable {
                id: key.id.clone(),
                texture_type: key.texture_type,
                resolution: key.resolution,
            }
            .into());
        }
        let url = texture.url_for(key.texture_type, key.resolution)?;

        let path = self.texture_path(key);
        trace!("resolve_and_download: {} -> {}", key, path.display());
        self.fetcher
            .download(url, &path, force)
            .map_err(|source| ManagerError::Download {
                key: key.to_string(),
                source,
            })?;

        Ok(path)
    }

    /// Resolves `key` and decodes the file as 16-bit RGBA.
    pub fn load_texture_rgba16(
        &self,
        key: &TextureKey,
        force: bool,
    ) -> Result<Rgba16Image, ManagerError> {
        let path = self.resolve_and_download(key, force)?;
        let image = image::open(&path).map_err(|e| ManagerError::Image {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(image.to_rgba16())
    }

    /// Keys of every file available for `id`.
    pub fn available_keys(&self, id: &str) -> Result<Vec<TextureKey>, ManagerError> {
        let texture = self
            .textures
            .get(id)
            .ok_or_else(|| ManagerError::NotFound(id.to_string()))?;

        Ok(TextureType::ALL
            .into_iter()
            .flat_map(|ty| {
                texture
                    .available_resolutions(ty)
                    .into_iter()
                    .map(move |res: TextureResolution| TextureKey::new(id, ty, res))
            })
            .collect())
    }

    /// How many of the files available for `id` are cached.
    pub fn cache_state(&self, id: &str) -> Result<CacheState, ManagerError> {
        let keys = self.available_keys(id)?;
        let cached = keys
            .iter()
            .filter(|key| self.texture_path(key).exists())
            .count();

        Ok(match cached {
            0 => CacheState::Listed,
            n if n == keys.len() => CacheState::FullyCached,
            _ => CacheState::PartiallyCached,
        })
    }

    // =========================================================================
    // Storage root
    // =========================================================================

    /// Moves the manager to another storage root.
    ///
    /// The directory is created if needed and the catalog found there is
    /// read. If that read fails the manager stays on its current root with
    /// its current catalog. Otherwise the switch is committed, and with
    /// `refresh` the catalog is then refreshed from the remote service and
    /// saved; a failed refresh leaves the manager on the new root with the
    /// catalog it read there, unsaved.
    pub fn set_storage_path(
        &mut self,
        storage_path: impl Into<PathBuf>,
        refresh: bool,
    ) -> Result<(), ManagerError> {
        let storage_path = storage_path.into();
        ensure_dir(&storage_path)?;
        let textures = read_catalog(&storage_path.join(CATALOG_FILE))?;

        info!("Switching storage root to {}", storage_path.display());
        self.thumbnails = ThumbnailCache::new(&storage_path, &self.thumbnail_config);
        self.storage_path = storage_path;
        self.textures = textures;

        if refresh {
            self.refresh_from_remote()?;
            self.save()?;
        }
        Ok(())
    }
}

fn ensure_dir(path: &Path) -> Result<(), ManagerError> {
    if !path.exists() {
        info!("Creating storage directory {}", path.display());
        std::fs::create_dir_all(path).map_err(|source| ManagerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Reads a catalog file. A missing file is an empty catalog.
fn read_catalog(path: &Path) -> Result<BTreeMap<String, Texture>, ManagerError> {
    if !path.exists() {
        info!("No catalog at {}, starting empty", path.display());
        return Ok(BTreeMap::new());
    }

    let Value::Object(entries) = storage::read_json_file(path)? else {
        error!("Catalog {} is not a JSON object", path.display());
        return Err(ManagerError::InvalidCatalog {
            path: path.to_path_buf(),
        });
    };

    let mut textures = BTreeMap::new();
    for (id, value) in entries {
        if id.is_empty() {
            warn!("Skipping catalog entry with an empty ID");
            continue;
        }

        let mut texture = Texture::from_json(&value);
        if texture.id() != id {
            warn!(
                "Catalog entry {} carries ID '{}', using the catalog key",
                id,
                texture.id()
            );
            texture.set_id(id.clone());
        }
        textures.insert(id, texture);
    }

    info!("Loaded {} textures from {}", textures.len(), path.display());
    Ok(textures)
}
