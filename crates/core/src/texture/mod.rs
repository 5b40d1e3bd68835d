//! Texture assets: the entity, its enumerations and cache keys, and the
//! remote endpoints and thumbnail cache it populates itself from.

mod entity;
mod json;
mod remote;
mod thumbnail;
mod types;

pub use entity::{Texture, UrlMap};
pub use json::json_safe_get;
pub use remote::RemoteSource;
pub use thumbnail::ThumbnailCache;
pub use types::{ParseKeyError, TextureKey, TextureResolution, TextureType};

use thiserror::Error;

/// Errors from querying a texture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    /// The texture has no file for this (type, resolution).
    #[error("Texture {id} has no {texture_type} map at {resolution}")]
    Unavailable {
        id: String,
        texture_type: TextureType,
        resolution: TextureResolution,
    },
}

/// Errors from populating a texture from the remote service.
#[derive(Debug, Error)]
pub enum PopulateError {
    /// The asset is not part of the asset list.
    #[error("Asset {0} not found in asset list")]
    MissingAsset(String),

    /// The files index could not be fetched, parsed, or was empty.
    #[error("Files index unavailable for asset {id} ({url})")]
    FilesIndexUnavailable { id: String, url: String },

    /// The thumbnail could not be fetched or decoded.
    #[error("Thumbnail unavailable for texture {id} ({url})")]
    ThumbnailUnavailable { id: String, url: String },

    /// The thumbnail could not be encoded or written.
    #[error("Failed to cache thumbnail for texture {id}: {reason}")]
    ThumbnailWrite { id: String, reason: String },
}
