//! Layered CLI configuration: defaults, then an optional TOML file, then
//! `STUDYPLAN_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_STORE_PATH: &str = "~/.local/share/studyplan/planner.db";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// SQLite file holding the planner data. A leading `~/` is expanded.
  pub store_path: PathBuf,
  /// Default tracing directive when `RUST_LOG` is unset.
  pub log_level:  String,
}

impl CliConfig {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", DEFAULT_STORE_PATH)?
      .set_default("log_level", DEFAULT_LOG_LEVEL)?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("STUDYPLAN"))
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
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
