//! The texture entity.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use super::json::json_safe_get;
use super::{
    PopulateError, RemoteSource, TextureError, TextureResolution, TextureType, ThumbnailCache,
};
use crate::fetch::Fetcher;

/// Resolution label -> remote file URL.
pub type UrlMap = BTreeMap<String, String>;

/// One remote texture asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture {
    id: String,
    name: String,
    source: String,
    source_native_id: String,
    thumbnail_url: String,
    tags: Vec<String>,
    /// Largest available size as reported by the source, `[width, height]`.
    max_resolution: Vec<u32>,
    is_pinned: bool,
    urls: BTreeMap<TextureType, UrlMap>,
}

impl Texture {
    /// Creates an empty texture with the given catalog ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_native_id(&self) -> &str {
        &self.source_native_id
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn max_resolution(&self) -> Option<(u32, u32)> {
        match self.max_resolution.as_slice() {
            [w, h] => Some((*w, *h)),
            _ => None,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.is_pinned = pinned;
    }

    /// All URLs of one map type, including unrecognized labels.
    pub fn urls(&self, texture_type: TextureType) -> Option<&UrlMap> {
        self.urls.get(&texture_type)
    }

    /// Records the URL of one (type, label) file.
    pub fn insert_url(
        &mut self,
        texture_type: TextureType,
        label: impl Into<String>,
        url: impl Into<String>,
    ) {
        self.urls
            .entry(texture_type)
            .or_default()
            .insert(label.into(), url.into());
    }

    /// Recognized resolutions available for `texture_type`.
    pub fn available_resolutions(&self, texture_type: TextureType) -> BTreeSet<TextureResolution> {
        self.urls
            .get(&texture_type)
            .into_iter()
            .flat_map(|map| map.keys())
            .map(|label| TextureResolution::from_label(label))
            .filter(TextureResolution::is_known)
            .collect()
    }

    /// Whether any file of `texture_type` is listed.
    pub fn has_type(&self, texture_type: TextureType) -> bool {
        self.urls
            .get(&texture_type)
            .is_some_and(|map| !map.is_empty())
    }

    /// Whether `texture_type` is available at `resolution`.
    pub fn has_texture(&self, texture_type: TextureType, resolution: TextureResolution) -> bool {
        self.has_type(texture_type) && self.available_resolutions(texture_type).contains(&resolution)
    }

    /// Remote URL of one file.
    pub fn url_for(
        &self,
        texture_type: TextureType,
        resolution: TextureResolution,
    ) -> Result<&str, TextureError> {
        let unavailable = || TextureError::Unavailable {
            id: self.id.clone(),
            texture_type,
            resolution,
        };

        if !resolution.is_known() {
            return Err(unavailable());
        }

        self.urls
            .get(&texture_type)
            .and_then(|map| map.get(resolution.label()))
            .map(String::as_str)
            .ok_or_else(unavailable)
    }

    /// Fills this texture from the remote service.
    ///
    /// `asset_list` is the asset-list document keyed by source-native ID.
    /// The per-asset files index is fetched, then the thumbnail is cached;
    /// both must succeed.
    pub fn populate_from_remote(
        &mut self,
        source_native_id: &str,
        asset_list: &Value,
        fetcher: &Fetcher,
        remote: &RemoteSource,
        thumbnails: &ThumbnailCache,
    ) -> Result<(), PopulateError> {
        debug!("Texture::populate_from_remote: {}", source_native_id);

        let Some(asset) = asset_list.get(source_native_id) else {
            error!("Asset {} not found in asset list", source_native_id);
            return Err(PopulateError::MissingAsset(source_native_id.to_string()));
        };

        self.source = remote.name().to_string();
        self.source_native_id = source_native_id.to_string();

        json_safe_get(asset, "name", &mut self.name);
        json_safe_get(asset, "thumbnail_url", &mut self.thumbnail_url);
        json_safe_get(asset, "tags", &mut self.tags);
        json_safe_get(asset, "max_resolution", &mut self.max_resolution);

        // texture files
        let files_url = remote.files_url(source_native_id);
        let files = fetcher
            .fetch_json(&files_url, fetcher.timeout())
            .ok_or_else(|| {
                error!("Files index unavailable for asset {}", source_native_id);
                PopulateError::FilesIndexUnavailable {
                    id: source_native_id.to_string(),
                    url: files_url.clone(),
                }
            })?;

        self.urls.clear();
        for texture_type in TextureType::ALL {
            let Some(entries) = files.get(texture_type.remote_key()).and_then(Value::as_object)
            else {
                continue;
            };

            for (label, entry) in entries {
                match entry.pointer("/png/url").and_then(Value::as_str) {
                    Some(url) => self.insert_url(texture_type, label.clone(), url),
                    None => warn!(
                        "Asset {}: no png url for {} {}",
                        source_native_id,
                        texture_type.name(),
                        label
                    ),
                }
            }
        }

        // thumbnail
        if self.thumbnail_url.is_empty() {
            error!("Asset {} has no thumbnail url", source_native_id);
            return Err(PopulateError::ThumbnailUnavailable {
                id: self.id.clone(),
                url: String::new(),
            });
        }
        thumbnails.ensure(fetcher, &self.id, &self.thumbnail_url)?;

        Ok(())
    }

    /// Serializes this texture to its persisted form.
    pub fn to_json(&self) -> Value {
        let mut json = json!({
            "id": self.id,
            "name": self.name,
            "source": self.source,
            "source_native_id": self.source_native_id,
            "thumbnail_url": self.thumbnail_url,
            "tags": self.tags,
            "max_resolution": self.max_resolution,
            "is_pinned": self.is_pinned,
        });

        if let Value::Object(map) = &mut json {
            for texture_type in TextureType::ALL {
                let urls: Map<String, Value> = self
                    .urls
                    .get(&texture_type)
                    .into_iter()
                    .flatten()
                    .map(|(label, url)| (label.clone(), Value::String(url.clone())))
                    .collect();
                map.insert(texture_type.persisted_key().to_string(), Value::Object(urls));
            }
        }

        json
    }

    /// Deserializes a texture from its persisted form.
    ///
    /// Every field is read on its own; missing or mistyped keys are logged
    /// and left at their defaults.
    pub fn from_json(json: &Value) -> Self {
        let mut texture = Self::default();

        json_safe_get(json, "id", &mut texture.id);
        json_safe_get(json, "name", &mut texture.name);
        json_safe_get(json, "source", &mut texture.source);
        if json.get("source_native_id").is_none() && json.get("id_from_source").is_some() {
            json_safe_get(json, "id_from_source", &mut texture.source_native_id);
        } else {
            json_safe_get(json, "source_native_id", &mut texture.source_native_id);
        }
        json_safe_get(json, "thumbnail_url", &mut texture.thumbnail_url);
        json_safe_get(json, "tags", &mut texture.tags);
        json_safe_get(json, "max_resolution", &mut texture.max_resolution);
        json_safe_get(json, "is_pinned", &mut texture.is_pinned);

        for texture_type in TextureType::ALL {
            let mut urls = UrlMap::new();
            if json_safe_get(json, texture_type.persisted_key(), &mut urls) && !urls.is_empty() {
                texture.urls.insert(texture_type, urls);
            }
        }

        texture
    }

    /// Replaces the ID. Only the manager uses this, before insertion.
    pub(crate) fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }
}
