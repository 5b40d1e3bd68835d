pub mod config;
pub mod fetch;
pub mod manager;
pub mod settings;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod texture;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, FetchConfig, RemoteConfig, StorageConfig, ThumbnailConfig,
};
pub use fetch::{DownloadError, DownloadOutcome, FetchError, Fetcher, HttpTransport, Transport};
pub use manager::{CacheState, ManagerError, RefreshReport, Rgba16Image, TextureManager};
pub use settings::{resolve_storage_path, Settings};
pub use storage::StorageError;
pub use texture::{
    PopulateError, Texture, TextureError, TextureKey, TextureResolution, TextureType,
};
