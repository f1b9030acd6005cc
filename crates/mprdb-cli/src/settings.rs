//! Node configuration: an optional TOML file layered under `MPRDB_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, Result, anyhow};
use mprdb_directory::DirectoryConfig;
use mprdb_engine::EngineConfig;
use mprdb_sign::FileKeyStore;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
  /// Base URL of the central directory. Only network commands need it.
  #[serde(default)]
  pub directory_url:        Option<String>,
  #[serde(default = "default_database_path")]
  pub database_path:        PathBuf,
  #[serde(default = "default_private_key_path")]
  pub private_key_path:     PathBuf,
  #[serde(default = "default_public_key_path")]
  pub public_key_path:      PathBuf,
  #[serde(default = "default_timeout_secs")]
  pub fetch_timeout_secs:   u64,
  #[serde(default = "default_timeout_secs")]
  pub request_timeout_secs: u64,
  #[serde(default = "default_channel_capacity")]
  pub channel_capacity:     usize,
}

fn default_database_path() -> PathBuf { PathBuf::from("./mprdb.db") }
fn default_private_key_path() -> PathBuf { PathBuf::from("./mprdb-priv.key") }
fn default_public_key_path() -> PathBuf { PathBuf::from("./mprdb-pub.key") }
fn default_timeout_secs() -> u64 { 30 }
fn default_channel_capacity() -> usize { 2048 }

impl NodeConfig {
  /// Read `path` if it exists, then apply `MPRDB_*` overrides.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MPRDB").try_parsing(true))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise NodeConfig")
  }

  pub fn database_path(&self) -> PathBuf { expand_tilde(&self.database_path) }

  pub fn key_store(&self) -> FileKeyStore {
    FileKeyStore::new(
      expand_tilde(&self.private_key_path),
      expand_tilde(&self.public_key_path),
    )
  }

  pub fn directory(&self) -> Result<DirectoryConfig> {
    let base_url = self
      .directory_url
      .clone()
      .filter(|url| !url.trim().is_empty())
      .ok_or_else(|| {
        anyhow!("directory_url is not set (config file or MPRDB_DIRECTORY_URL)")
      })?;

    Ok(DirectoryConfig {
      base_url,
      timeout: Duration::from_secs(self.request_timeout_secs),
    })
  }

  pub fn engine(&self) -> EngineConfig {
    EngineConfig {
      fetch_timeout:    Duration::from_secs(self.fetch_timeout_secs),
      channel_capacity: self.channel_capacity,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
