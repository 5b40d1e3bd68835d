use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
}

/// Local storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Explicit storage root. When unset, the last used root from the
    /// settings file is used, then the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Settings file location (default: <config_dir>/texvault/settings.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn settings_file(&self) -> PathBuf {
        self.settings_file.clone().unwrap_or_else(default_settings_file)
    }
}

fn default_settings_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("texvault"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("settings.json")
}

/// Remote asset service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Source name, used as the prefix of every local texture ID
    #[serde(default = "default_source")]
    pub source: String,
    /// Asset service base URL (e.g., "https://api.polyhaven.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            base_url: default_base_url(),
        }
    }
}

fn default_source() -> String {
    "PolyHaven".to_string()
}

fn default_base_url() -> String {
    "https://api.polyhaven.com".to_string()
}

/// Fetch timeouts and client identity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Timeout for JSON and image fetches, in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Timeout for texture file downloads, in milliseconds (default: 120000)
    #[serde(default = "default_download_timeout_ms")]
    pub download_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            download_timeout_ms: default_download_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_download_timeout_ms() -> u64 {
    120_000
}

fn default_user_agent() -> String {
    format!("texvault/{}", env!("CARGO_PKG_VERSION"))
}

/// Cached thumbnail dimensions
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumbnail_side")]
    pub width: u32,
    #[serde(default = "default_thumbnail_side")]
    pub height: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: default_thumbnail_side(),
            height: default_thumbnail_side(),
        }
    }
}

fn default_thumbnail_side() -> u32 {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.storage.path.is_none());
        assert_eq!(config.remote.source, "PolyHaven");
        assert_eq!(config.remote.base_url, "https://api.polyhaven.com");
        assert_eq!(config.fetch.timeout_ms, 5000);
        assert_eq!(config.fetch.download_timeout_ms, 120_000);
        assert_eq!(config.thumbnail.width, 64);
        assert_eq!(config.thumbnail.height, 64);
    }

    #[test]
    fn test_deserialize_custom_sections() {
        let toml = r#"
[storage]
path = "/data/textures"
settings_file = "/data/settings.json"

[remote]
base_url = "http://localhost:9000"

[fetch]
timeout_ms = 250

[thumbnail]
width = 128
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.storage.path.as_deref().and_then(|p| p.to_str()),
            Some("/data/textures")
        );
        assert_eq!(
            config.storage.settings_file().to_str(),
            Some("/data/settings.json")
        );
        assert_eq!(config.remote.base_url, "http://localhost:9000");
        assert_eq!(config.remote.source, "PolyHaven");
        assert_eq!(config.fetch.timeout(), Duration::from_millis(250));
        assert_eq!(config.fetch.download_timeout_ms, 120_000);
        assert_eq!(config.thumbnail.width, 128);
        assert_eq!(config.thumbnail.height, 64);
    }

    #[test]
    fn test_default_user_agent_carries_version() {
        let config = FetchConfig::default();
        assert!(config.user_agent.starts_with("texvault/"));
    }
}
