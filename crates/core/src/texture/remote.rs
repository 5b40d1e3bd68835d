//! Remote asset service endpoints.

use crate::config::RemoteConfig;

/// Endpoint layout of the remote asset service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    name: String,
    base_url: String,
}

impl RemoteSource {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            name: config.source.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Source name stored on every texture it produces.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asset list, keyed by source-native asset ID.
    pub fn asset_list_url(&self) -> String {
        format!("{}/assets?type=textures", self.base_url)
    }

    /// Files index of one asset.
    pub fn files_url(&self, source_native_id: &str) -> String {
        format!("{}/files/{}", self.base_url, source_native_id)
    }

    /// Local catalog ID of a remote asset, `<source>_<native id>`.
    pub fn local_id(&self, source_native_id: &str) -> String {
        format!("{}_{}", self.name, source_native_id)
    }
}
