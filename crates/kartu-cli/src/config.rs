//! Configuration for the `kartu` binary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use kartu_live::LiveConfig;
use serde::Deserialize;

/// Deserialised from `kartu.toml` layered with `KARTU__*` variables, e.g.
/// `KARTU__LIVE__SKILL_STALENESS_MONTHS=4`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub store_path: PathBuf,
  pub live:       LiveConfig,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("kartu.db"),
      live:       LiveConfig::default(),
    }
  }
}

impl AppConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("KARTU").separator("__"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")
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
