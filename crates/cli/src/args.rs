//! Command line parsing.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use texvault_core::{TextureKey, TextureResolution, TextureType};

pub const USAGE: &str = "\
Usage: texvault [--config PATH] [--storage PATH] <command>

Commands:
  list                          List the catalog
  update                        Refresh the catalog from the remote service
  get <id> <type> <res> [--force]
                                Download one texture file and print its path
  pin <id> | unpin <id>         Set or clear the pin flag of an entry
  pinned <type> <res> [--force] Download every pinned texture at one resolution
  storage <path> [--refresh]    Switch the storage root
  purge                         Delete every local file under the storage root

Types: diffuse, normal, displacement. Resolutions: 1k, 2k, 4k, 8k.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Update,
    Get { key: TextureKey, force: bool },
    Pin { id: String, pinned: bool },
    Pinned {
        texture_type: TextureType,
        resolution: TextureResolution,
        force: bool,
    },
    Storage { path: PathBuf, refresh: bool },
    Purge,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub storage: Option<PathBuf>,
    pub command: Command,
}

impl Args {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = None;
        let mut storage = None;
        let mut force = false;
        let mut refresh = false;
        let mut help = false;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    config = Some(PathBuf::from(args.next().context("--config needs a path")?))
                }
                "--storage" => {
                    storage = Some(PathBuf::from(args.next().context("--storage needs a path")?))
                }
                "--force" => force = true,
                "--refresh" => refresh = true,
                "-h" | "--help" => help = true,
                flag if flag.starts_with("--") => bail!("Unknown option {}\n\n{}", flag, USAGE),
                _ => positional.push(arg),
            }
        }

        if help {
            return Ok(Self {
                config,
                storage,
                command: Command::Help,
            });
        }

        let words: Vec<&str> = positional.iter().map(String::as_str).collect();
        let command = match words.as_slice() {
            ["list"] => Command::List,
            ["update"] => Command::Update,
            ["get", id, ty, res] => Command::Get {
                key: TextureKey::new(id.to_string(), ty.parse()?, res.parse()?),
                force,
            },
            ["pin", id] => Command::Pin {
                id: id.to_string(),
                pinned: true,
            },
            ["unpin", id] => Command::Pin {
                id: id.to_string(),
                pinned: false,
            },
            ["pinned", ty, res] => Command::Pinned {
                texture_type: ty.parse()?,
                resolution: res.parse()?,
                force,
            },
            ["storage", path] => Command::Storage {
                path: PathBuf::from(*path),
                refresh,
            },
            ["purge"] => Command::Purge,
            _ => bail!("{}", USAGE),
        };

        Ok(Self {
            config,
            storage,
            command,
        })
    }
}
