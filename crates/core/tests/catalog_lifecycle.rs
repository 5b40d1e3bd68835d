//! Catalog lifecycle integration tests.
//!
//! These tests drive the texture manager against a mock transport:
//! - Loading and saving the catalog file
//! - Refreshing from the remote asset list (success, partial failure, outage)
//! - Resolving keys to cached files and downloading on demand
//! - Fetch deadlines

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use texvault_core::{
    testing::{fixtures, MockTransport},
    CacheState, Config, Fetcher, ManagerError, TextureKey, TextureManager, TextureResolution,
    TextureType,
};

const BASE_URL: &str = "http://api.test";

fn asset_list_url() -> String {
    format!("{}/assets?type=textures", BASE_URL)
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.remote.base_url = BASE_URL.to_string();
    config.fetch.timeout_ms = 500;
    config.fetch.download_timeout_ms = 500;
    config
}

/// Test helper wiring a manager to a mock transport.
struct TestHarness {
    manager: TextureManager,
    transport: MockTransport,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let transport = MockTransport::new();
        let manager = Self::manager_at(&transport, &temp_dir.path().join("store"));
        Self {
            manager,
            transport,
            temp_dir,
        }
    }

    fn manager_at(transport: &MockTransport, path: &std::path::Path) -> TextureManager {
        let config = test_config();
        let fetcher = Fetcher::new(Arc::new(transport.clone()), &config.fetch)
            .expect("Failed to create fetcher");
        TextureManager::with_fetcher(&config, path, fetcher).expect("Failed to create manager")
    }

    /// Serves an asset list with one Diffuse 1k + Normal 2k asset per ID.
    fn serve_assets(&self, ids: &[&str]) {
        self.transport
            .set_json(&asset_list_url(), &fixtures::asset_list(ids));
        for id in ids {
            let diffuse = format!("http://cdn/{}_diffuse_1k.png", id);
            let normal = format!("http://cdn/{}_nor_gl_2k.png", id);
            fixtures::serve_asset(
                &self.transport,
                BASE_URL,
                id,
                &[("Diffuse", "1k", diffuse.as_str()), ("nor_gl", "2k", normal.as_str())],
            );
            self.transport
                .set_response(&diffuse, fixtures::png_bytes(4, 2));
            self.transport
                .set_response(&normal, fixtures::png_bytes(8, 8));
        }
    }

    fn key(id: &str, texture_type: TextureType, resolution: TextureResolution) -> TextureKey {
        TextureKey::new(id, texture_type, resolution)
    }
}

#[test]
fn test_empty_storage_loads_empty_catalog() {
    let mut h = TestHarness::new();

    h.manager.load().unwrap();

    assert!(h.manager.is_empty());
    assert!(h.temp_dir.path().join("store").is_dir());
    assert_eq!(h.transport.request_count(), 0);
}

#[test]
fn test_refresh_populates_catalog() {
    let mut h = TestHarness::new();
    h.transport
        .set_json(&asset_list_url(), &fixtures::asset_list(&["rock01"]));
    fixtures::serve_asset(
        &h.transport,
        BASE_URL,
        "rock01",
        &[("Diffuse", "1k", "http://x/rock01_diffuse_1k.png")],
    );

    let report = h.manager.refresh_from_remote().unwrap();

    assert_eq!(report.listed, 1);
    assert_eq!(report.added, 1);
    assert!(report.failed.is_empty());
    assert_eq!(h.manager.len(), 1);

    let texture = h.manager.get("PolyHaven_rock01").unwrap();
    assert_eq!(texture.id(), "PolyHaven_rock01");
    assert!(texture.has_texture(TextureType::Diffuse, TextureResolution::R1k));
    assert!(!texture.has_texture(TextureType::Normal, TextureResolution::R1k));
    assert!(h.manager.thumbnail_path("PolyHaven_rock01").exists());
}

#[test]
fn test_resolve_existing_file_makes_no_request() {
    let h = TestHarness::new();
    std::fs::write(
        h.manager.catalog_path(),
        r#"{"x": {"id": "x", "diffuse_urls": {"1k": "http://cdn/x.png"}}}"#,
    )
    .unwrap();
    let mut manager = h.manager;
    manager.load().unwrap();

    let key = TestHarness::key("x", TextureType::Diffuse, TextureResolution::R1k);
    let expected = manager.texture_path(&key);
    std::fs::write(&expected, b"cached").unwrap();

    let path = manager.resolve_and_download(&key, false).unwrap();

    assert_eq!(path, expected);
    assert_eq!(h.transport.request_count(), 0);
    assert_eq!(std::fs::read(&path).unwrap(), b"cached");
}

#[test]
fn test_resolve_downloads_once() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();
    h.transport.clear_requests();

    let key = TestHarness::key("PolyHaven_rock01", TextureType::Diffuse, TextureResolution::R1k);
    let first = h.manager.resolve_and_download(&key, false).unwrap();
    let second = h.manager.resolve_and_download(&key, false).unwrap();

    assert_eq!(first, second);
    assert!(first.exists());
    assert_eq!(
        first.file_name().and_then(|n| n.to_str()),
        Some("PolyHaven_rock01_Diffuse_1k.png")
    );
    assert_eq!(h.transport.requests_for("http://cdn/rock01_diffuse_1k.png"), 1);
    assert_eq!(h.transport.request_count(), 1);
}

#[test]
fn test_force_redownloads() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();
    h.transport.clear_requests();

    let key = TestHarness::key("PolyHaven_rock01", TextureType::Diffuse, TextureResolution::R1k);
    let path = h.manager.texture_path(&key);
    std::fs::write(&path, b"stale").unwrap();

    h.manager.resolve_and_download(&key, true).unwrap();

    assert_eq!(h.transport.request_count(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), fixtures::png_bytes(4, 2));
}

#[test]
fn test_resolve_error_kinds() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();

    let missing = TestHarness::key("PolyHaven_nope", TextureType::Diffuse, TextureResolution::R1k);
    assert!(matches!(
        h.manager.resolve_and_download(&missing, false),
        Err(ManagerError::NotFound(_))
    ));

    let unavailable =
        TestHarness::key("PolyHaven_rock01", TextureType::Displacement, TextureResolution::R1k);
    assert!(matches!(
        h.manager.resolve_and_download(&unavailable, false),
        Err(ManagerError::Unavailable(_))
    ));

    let wrong_res = TestHarness::key("PolyHaven_rock01", TextureType::Normal, TextureResolution::R8k);
    assert!(matches!(
        h.manager.resolve_and_download(&wrong_res, false),
        Err(ManagerError::Unavailable(_))
    ));

    h.transport
        .set_failure("http://cdn/rock01_diffuse_1k.png", "connection reset");
    let failing =
        TestHarness::key("PolyHaven_rock01", TextureType::Diffuse, TextureResolution::R1k);
    assert!(matches!(
        h.manager.resolve_and_download(&failing, false),
        Err(ManagerError::Download { .. })
    ));
    assert!(!h.manager.texture_path(&failing).exists());
}

#[test]
fn test_failed_refresh_leaves_catalog_file_unchanged() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01", "wood02"]);
    h.manager.refresh_from_remote().unwrap();
    h.manager.save().unwrap();
    let before = std::fs::read(h.manager.catalog_path()).unwrap();

    h.transport.remove(&asset_list_url());
    let result = h.manager.refresh_from_remote();
    assert!(matches!(
        result,
        Err(ManagerError::AssetListUnavailable { .. })
    ));

    h.manager.save().unwrap();
    let after = std::fs::read(h.manager.catalog_path()).unwrap();
    assert_eq!(before, after);
    assert_eq!(h.manager.len(), 2);
}

#[test]
fn test_refresh_skips_failing_asset() {
    let mut h = TestHarness::new();
    h.serve_assets(&["good"]);
    h.transport
        .set_json(&asset_list_url(), &fixtures::asset_list(&["bad", "good"]));

    let report = h.manager.refresh_from_remote().unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed, vec!["PolyHaven_bad".to_string()]);
    assert!(h.manager.get("PolyHaven_good").is_some());
    assert!(h.manager.get("PolyHaven_bad").is_none());
}

#[test]
fn test_refresh_keeps_pins_and_delisted_entries() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01", "wood02"]);
    h.manager.refresh_from_remote().unwrap();
    h.manager.set_pinned("PolyHaven_rock01", true).unwrap();

    h.transport
        .set_json(&asset_list_url(), &fixtures::asset_list(&["rock01"]));
    let report = h.manager.refresh_from_remote().unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.added, 0);
    assert!(h.manager.get("PolyHaven_rock01").unwrap().is_pinned());
    assert!(h.manager.get("PolyHaven_wood02").is_some());
    assert_eq!(h.manager.pinned().count(), 1);
    assert!(matches!(
        h.manager.set_pinned("PolyHaven_none", true),
        Err(ManagerError::NotFound(_))
    ));
}

#[test]
fn test_save_and_reload_round_trip() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();
    h.manager.set_pinned("PolyHaven_rock01", true).unwrap();
    h.manager.save().unwrap();

    let mut reloaded = TestHarness::manager_at(&h.transport, h.manager.storage_path());
    reloaded.load().unwrap();

    assert_eq!(reloaded.textures(), h.manager.textures());
}

#[test]
fn test_load_replaces_memory_and_rejects_malformed_file() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();

    std::fs::write(h.manager.catalog_path(), "{ not json").unwrap();
    assert!(h.manager.load().is_err());
    assert_eq!(h.manager.len(), 1);

    std::fs::write(h.manager.catalog_path(), "[1, 2]").unwrap();
    assert!(matches!(
        h.manager.load(),
        Err(ManagerError::InvalidCatalog { .. })
    ));

    std::fs::write(
        h.manager.catalog_path(),
        r#"{"PolyHaven_other": {"name": "Other"}}"#,
    )
    .unwrap();
    h.manager.load().unwrap();
    assert_eq!(h.manager.len(), 1);
    let other = h.manager.get("PolyHaven_other").unwrap();
    assert_eq!(other.id(), "PolyHaven_other");
    assert_eq!(other.name(), "Other");
}

#[test]
fn test_cache_state_progression() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();
    let id = "PolyHaven_rock01";

    assert_eq!(h.manager.cache_state(id).unwrap(), CacheState::Listed);

    h.manager
        .resolve_and_download(
            &TestHarness::key(id, TextureType::Diffuse, TextureResolution::R1k),
            false,
        )
        .unwrap();
    assert_eq!(h.manager.cache_state(id).unwrap(), CacheState::PartiallyCached);

    h.manager
        .resolve_and_download(
            &TestHarness::key(id, TextureType::Normal, TextureResolution::R2k),
            false,
        )
        .unwrap();
    assert_eq!(h.manager.cache_state(id).unwrap(), CacheState::FullyCached);
    assert_eq!(h.manager.available_keys(id).unwrap().len(), 2);
}

#[test]
fn test_load_texture_rgba16() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();

    let key = TestHarness::key("PolyHaven_rock01", TextureType::Diffuse, TextureResolution::R1k);
    let pixels = h.manager.load_texture_rgba16(&key, false).unwrap();

    assert_eq!(pixels.dimensions(), (4, 2));
    assert_eq!(pixels.get_pixel(0, 0).0, [200 * 257, 120 * 257, 40 * 257, 65535]);
}

#[test]
fn test_set_storage_path_switches_catalog() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();
    h.manager.save().unwrap();
    let first_root = h.manager.storage_path().to_path_buf();

    let second_root = h.temp_dir.path().join("second/store");
    h.manager.set_storage_path(&second_root, false).unwrap();
    assert!(second_root.is_dir());
    assert!(h.manager.is_empty());

    h.manager.set_storage_path(&second_root, true).unwrap();
    assert_eq!(h.manager.len(), 1);
    assert!(second_root.join("db.json").exists());
    assert!(second_root.join("PolyHaven_rock01_thumbnail.png").exists());

    h.manager.set_storage_path(&first_root, false).unwrap();
    assert_eq!(h.manager.len(), 1);
}

#[test]
fn test_set_storage_path_keeps_current_root_on_malformed_catalog() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();
    h.manager.save().unwrap();
    let first_root = h.manager.storage_path().to_path_buf();

    let corrupt_root = h.temp_dir.path().join("corrupt");
    std::fs::create_dir_all(&corrupt_root).unwrap();
    std::fs::write(corrupt_root.join("db.json"), "{ corrupt").unwrap();
    let not_object_root = h.temp_dir.path().join("not_object");
    std::fs::create_dir_all(&not_object_root).unwrap();
    std::fs::write(not_object_root.join("db.json"), "[1, 2]").unwrap();

    let result = h.manager.set_storage_path(&corrupt_root, false);
    assert!(matches!(result, Err(ManagerError::Storage(_))));
    let result = h.manager.set_storage_path(&not_object_root, false);
    assert!(matches!(result, Err(ManagerError::InvalidCatalog { .. })));

    assert_eq!(h.manager.storage_path(), first_root.as_path());
    assert_eq!(h.manager.len(), 1);
    assert_eq!(
        h.manager.thumbnail_path("PolyHaven_rock01"),
        first_root.join("PolyHaven_rock01_thumbnail.png")
    );

    h.manager.save().unwrap();
    assert_eq!(
        std::fs::read_to_string(corrupt_root.join("db.json")).unwrap(),
        "{ corrupt"
    );
    assert_eq!(
        std::fs::read_to_string(not_object_root.join("db.json")).unwrap(),
        "[1, 2]"
    );
}

#[test]
fn test_set_storage_path_with_refresh_while_remote_down() {
    let mut h = TestHarness::new();
    h.serve_assets(&["rock01"]);
    h.manager.refresh_from_remote().unwrap();
    h.manager.save().unwrap();
    let first_root = h.manager.storage_path().to_path_buf();
    let first_catalog = std::fs::read(first_root.join("db.json")).unwrap();

    h.transport.remove(&asset_list_url());
    let second_root = h.temp_dir.path().join("second");
    let result = h.manager.set_storage_path(&second_root, true);

    // The switch is committed before the refresh runs.
    assert!(matches!(result, Err(ManagerError::AssetListUnavailable { .. })));
    assert_eq!(h.manager.storage_path(), second_root.as_path());
    assert!(h.manager.is_empty());
    assert!(!second_root.join("db.json").exists());
    assert_eq!(std::fs::read(first_root.join("db.json")).unwrap(), first_catalog);
}

#[test]
fn test_fetch_timeout_then_success() {
    let transport = MockTransport::new();
    let fetcher = Fetcher::new(Arc::new(transport.clone()), &test_config().fetch).unwrap();
    transport.set_response("http://cdn/slow.json", b"{\"ok\": true}".to_vec());
    transport.set_delay("http://cdn/slow.json", Duration::from_millis(300));

    let err = fetcher
        .fetch("http://cdn/slow.json", Duration::from_millis(30))
        .unwrap_err();
    assert!(err.is_timeout());

    transport.clear_delay("http://cdn/slow.json");
    let value = fetcher
        .fetch_json("http://cdn/slow.json", Duration::from_millis(300))
        .unwrap();
    assert_eq!(value["ok"], true);
}
