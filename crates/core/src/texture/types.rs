//! Texture enumerations and cache keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resolution of a texture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextureResolution {
    R1k,
    R2k,
    R4k,
    R8k,
    /// Not a recognized resolution. Never part of a cache key.
    Unknown,
}

impl TextureResolution {
    /// All recognized resolutions, smallest first.
    pub const ALL: [TextureResolution; 4] = [Self::R1k, Self::R2k, Self::R4k, Self::R8k];

    pub fn label(&self) -> &'static str {
        match self {
            Self::R1k => "1k",
            Self::R2k => "2k",
            Self::R4k => "4k",
            Self::R8k => "8k",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a remote resolution label to a resolution, `Unknown` otherwise.
    pub fn from_label(label: &str) -> Self {
        match label {
            "1k" => Self::R1k,
            "2k" => Self::R2k,
            "4k" => Self::R4k,
            "8k" => Self::R8k,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for TextureResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextureResolution {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_label(&s.to_ascii_lowercase()) {
            Self::Unknown => Err(ParseKeyError::Resolution(s.to_string())),
            res => Ok(res),
        }
    }
}

/// Kind of texture map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextureType {
    Diffuse,
    Normal,
    Displacement,
}

impl TextureType {
    pub const ALL: [TextureType; 3] = [Self::Diffuse, Self::Normal, Self::Displacement];

    /// Display name, also used in cache file names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Diffuse => "Diffuse",
            Self::Normal => "Normal",
            Self::Displacement => "Displacement",
        }
    }

    /// Key of this map in the remote files index.
    pub fn remote_key(&self) -> &'static str {
        match self {
            Self::Diffuse => "Diffuse",
            Self::Normal => "nor_gl",
            Self::Displacement => "Displacement",
        }
    }

    /// Key of this map's URLs in the persisted catalog.
    pub fn persisted_key(&self) -> &'static str {
        match self {
            Self::Diffuse => "diffuse_urls",
            Self::Normal => "normal_urls",
            Self::Displacement => "displacement_urls",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for TextureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextureType {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseKeyError::Type(s.to_string()))
    }
}

/// Errors from parsing texture types, resolutions and keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseKeyError {
    #[error("Unknown texture type: {0}")]
    Type(String),

    #[error("Unknown texture resolution: {0}")]
    Resolution(String),

    #[error("Malformed texture key: {0}")]
    Malformed(String),
}

/// Names one texture file: which asset, which map, which resolution.
///
/// Displays as `<id>_<TypeName>_<label>`, the stem of the cached file.
/// Type names and labels never contain `_`, so the string parses back
/// unambiguously from the right even when `id` does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub id: String,
    pub texture_type: TextureType,
    pub resolution: TextureResolution,
}

impl TextureKey {
    pub fn new(
        id: impl Into<String>,
        texture_type: TextureType,
        resolution: TextureResolution,
    ) -> Self {
        Self {
            id: id.into(),
            texture_type,
            resolution,
        }
    }

    /// File name of the cached texture, `<key>.png`.
    pub fn file_name(&self) -> String {
        format!("{}.png", self)
    }
}

impl fmt::Display for TextureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.id,
            self.texture_type.name(),
            self.resolution.label()
        )
    }
}

impl FromStr for TextureKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, '_');
        let (Some(res), Some(ty), Some(id)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseKeyError::Malformed(s.to_string()));
        };
        if id.is_empty() {
            return Err(ParseKeyError::Malformed(s.to_string()));
        }

        let texture_type =
            TextureType::from_name(ty).ok_or_else(|| ParseKeyError::Type(ty.to_string()))?;
        let resolution = match TextureResolution::from_label(res) {
            TextureResolution::Unknown => {
                return Err(ParseKeyError::Resolution(res.to_string()))
            }
            res => res,
        };

        Ok(Self::new(id, texture_type, resolution))
    }
}
