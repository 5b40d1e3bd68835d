use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Fetch and download timeouts are not 0
/// - Thumbnail dimensions are not 0
/// - Remote base URL is http(s)
/// - Source name is usable as a texture ID prefix
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.fetch.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.timeout_ms cannot be 0".to_string(),
        ));
    }
    if config.fetch.download_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.download_timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.thumbnail.width == 0 || config.thumbnail.height == 0 {
        return Err(ConfigError::ValidationError(
            "thumbnail dimensions cannot be 0".to_string(),
        ));
    }

    let base_url = config.remote.base_url.as_str();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "remote.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }

    let source = config.remote.source.as_str();
    if source.is_empty() || source.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "remote.source must be a non-empty name without path separators, got '{}'",
            source
        )));
    }

    Ok(())
}
