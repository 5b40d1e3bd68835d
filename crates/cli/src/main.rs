mod args;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use texvault_core::{
    load_config, load_config_from_env, resolve_storage_path, validate_config, Config, Settings,
    TextureManager,
};

use args::{Args, Command, USAGE};

/// Config file picked up from the working directory when present.
const DEFAULT_CONFIG_FILE: &str = "texvault.toml";

fn main() {
    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = load(args.config.clone())?;
    validate_config(&config).context("Configuration validation failed")?;

    let settings_file = config.storage.settings_file();
    let mut settings = Settings::load(&settings_file);
    let storage_path = resolve_storage_path(
        args.storage.as_deref().or(config.storage.path.as_deref()),
        &settings,
    );
    info!("Storage root: {}", storage_path.display());

    let mut manager = TextureManager::new(&config, &storage_path)
        .context("Failed to create texture manager")?;
    manager.load().context("Failed to load catalog")?;

    commands::execute(&mut manager, args.command)?;

    settings.last_storage_path = Some(manager.storage_path().to_path_buf());
    settings
        .save(&settings_file)
        .with_context(|| format!("Failed to save settings to {}", settings_file.display()))?;
    debug!("Settings saved to {}", settings_file.display());
    Ok(())
}

/// Loads configuration from `--config`, then `TEXVAULT_CONFIG`, then
/// `texvault.toml` in the working directory, then the environment alone.
fn load(explicit: Option<PathBuf>) -> Result<Config> {
    let path = explicit
        .or_else(|| std::env::var("TEXVAULT_CONFIG").ok().map(PathBuf::from))
        .or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        });

    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => {
            debug!("No config file, using defaults and environment");
            load_config_from_env().context("Failed to load config from environment")
        }
    }
}
