//! Command handlers. Each one operates on a loaded manager; the caller
//! persists settings afterwards.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use texvault_core::{
    CacheState, ManagerError, TextureKey, TextureManager, TextureResolution, TextureType,
};

use crate::args::{Command, USAGE};

pub fn execute(manager: &mut TextureManager, command: Command) -> Result<()> {
    match command {
        Command::List => list(manager),
        Command::Update => update(manager),
        Command::Get { key, force } => get(manager, &key, force),
        Command::Pin { id, pinned } => pin(manager, &id, pinned),
        Command::Pinned {
            texture_type,
            resolution,
            force,
        } => download_pinned(manager, texture_type, resolution, force),
        Command::Storage { path, refresh } => storage(manager, &path, refresh),
        Command::Purge => purge(manager),
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn list(manager: &TextureManager) -> Result<()> {
    if manager.is_empty() {
        println!("The catalog is empty. Run `texvault update` to fetch it.");
        return Ok(());
    }

    for (id, texture) in manager.textures() {
        let state = match manager.cache_state(id)? {
            CacheState::Listed => "listed",
            CacheState::PartiallyCached => "partial",
            CacheState::FullyCached => "cached",
        };
        let pin = if texture.is_pinned() { "*" } else { " " };
        let maps: Vec<String> = TextureType::ALL
            .into_iter()
            .filter(|ty| texture.has_type(*ty))
            .map(|ty| {
                let resolutions: Vec<&str> = texture
                    .available_resolutions(ty)
                    .into_iter()
                    .map(|res| res.label())
                    .collect();
                format!("{}[{}]", ty.name(), resolutions.join(","))
            })
            .collect();

        println!("{} {:<40} {:<8} {}", pin, id, state, maps.join(" "));
    }
    Ok(())
}

fn update(manager: &mut TextureManager) -> Result<()> {
    let report = manager
        .refresh_from_remote()
        .context("Catalog refresh failed")?;
    manager.save().context("Failed to save catalog")?;

    println!(
        "{} listed, {} added, {} updated, {} failed",
        report.listed,
        report.added,
        report.updated,
        report.failed.len()
    );
    for id in &report.failed {
        println!("  failed: {}", id);
    }
    Ok(())
}

fn get(manager: &TextureManager, key: &TextureKey, force: bool) -> Result<()> {
    let path = manager
        .resolve_and_download(key, force)
        .with_context(|| format!("Failed to resolve {}", key))?;
    println!("{}", path.display());
    Ok(())
}

fn pin(manager: &mut TextureManager, id: &str, pinned: bool) -> Result<()> {
    manager.set_pinned(id, pinned)?;
    manager.save().context("Failed to save catalog")?;
    info!("{} {}", if pinned { "Pinned" } else { "Unpinned" }, id);
    Ok(())
}

/// Downloads the given map of every pinned texture. Entries lacking it are
/// skipped; any other failure aborts.
fn download_pinned(
    manager: &TextureManager,
    texture_type: TextureType,
    resolution: TextureResolution,
    force: bool,
) -> Result<()> {
    let keys: Vec<TextureKey> = manager
        .pinned()
        .map(|t| TextureKey::new(t.id(), texture_type, resolution))
        .collect();

    if keys.is_empty() {
        println!("No pinned textures.");
        return Ok(());
    }

    for key in keys {
        match manager.resolve_and_download(&key, force) {
            Ok(path) => println!("{}", path.display()),
            Err(ManagerError::Unavailable(e)) => warn!("Skipping: {}", e),
            Err(e) => return Err(e).with_context(|| format!("Failed to resolve {}", key)),
        }
    }
    Ok(())
}

fn storage(manager: &mut TextureManager, path: &Path, refresh: bool) -> Result<()> {
    manager
        .set_storage_path(path, refresh)
        .with_context(|| format!("Failed to switch storage to {}", path.display()))?;
    println!(
        "Storage root is now {} ({} textures)",
        manager.storage_path().display(),
        manager.len()
    );
    Ok(())
}

/// Deletes the storage root and starts over with an empty catalog there.
fn purge(manager: &mut TextureManager) -> Result<()> {
    let root = manager.storage_path().to_path_buf();
    warn!("Purging {}", root.display());

    if root.exists() {
        std::fs::remove_dir_all(&root)
            .with_context(|| format!("Failed to remove {}", root.display()))?;
    }
    manager.clear();
    manager.set_storage_path(&root, false)?;
    manager.save().context("Failed to save catalog")?;

    println!("Purged {}", root.display());
    Ok(())
}
