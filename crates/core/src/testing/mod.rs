//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`Transport`](crate::fetch::Transport), so
//! the fetcher, the texture entity and the manager can be exercised end to
//! end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use texvault_core::testing::{fixtures, MockTransport};
//!
//! let transport = MockTransport::new();
//! transport.set_json(
//!     "http://api/assets?type=textures",
//!     &fixtures::asset_list(&["rock01"]),
//! );
//! fixtures::serve_asset(&transport, "http://api", "rock01", &[("Diffuse", "1k", "http://x/d.png")]);
//! ```

mod mock_transport;

pub use mock_transport::MockTransport;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use serde_json::{json, Map, Value};

    use super::MockTransport;

    /// Thumbnail URL advertised for `id` by [`asset_list`].
    pub fn thumbnail_url(id: &str) -> String {
        format!("http://cdn/thumbs/{}.png", id)
    }

    /// Asset-list document with one entry per ID.
    ///
    /// Each entry is named after its ID and tagged `texture`.
    pub fn asset_list(ids: &[&str]) -> Value {
        let mut list = Map::new();
        for id in ids {
            list.insert(
                id.to_string(),
                json!({
                    "name": id,
                    "thumbnail_url": thumbnail_url(id),
                    "tags": ["texture"],
                    "max_resolution": [4096, 2048],
                }),
            );
        }
        Value::Object(list)
    }

    /// Files-index document from `(remote map key, label, url)` triples.
    pub fn files_index(entries: &[(&str, &str, &str)]) -> Value {
        let mut index = Map::new();
        for (map_key, label, url) in entries {
            let maps = index
                .entry(map_key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(maps) = maps {
                maps.insert(label.to_string(), json!({ "png": { "url": url } }));
            }
        }
        Value::Object(index)
    }

    /// Serves the files index and thumbnail of one asset.
    pub fn serve_asset(
        transport: &MockTransport,
        base_url: &str,
        id: &str,
        entries: &[(&str, &str, &str)],
    ) {
        transport.set_json(&format!("{}/files/{}", base_url, id), &files_index(entries));
        transport.set_response(&thumbnail_url(id), png_bytes(16, 16));
    }

    /// A solid-color PNG of the given size.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 120, 40, 255]),
        ));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("in-memory PNG encoding");
        bytes
    }
}
