//! `studyplan`: command-line front end for the study planner.
//!
//! # Usage
//!
//! ```
//! studyplan subject add Math --priority high
//! studyplan schedule add Math monday 09:00 10:30
//! studyplan task add Math "Problem set 3" --deadline 2024-09-06T17:00
//! studyplan --config ~/.config/studyplan/studyplan.toml stats
//! ```
//!
//! Configuration is read from `studyplan.toml` (or `--config`) and
//! `STUDYPLAN_*` environment variables; see [`app_config::CliConfig`].

mod app_config;
mod commands;
mod render;

use std::{io, path::PathBuf};

use anyhow::Context as _;
use app_config::{CliConfig, expand_tilde};
use clap::Parser;
use commands::Command;
use studyplan_core::Planner;
use studyplan_store_sqlite::SqliteMedium;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, filter::Directive};

#[derive(Parser)]
#[command(name = "studyplan", author, version, about = "Weekly study planner")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "studyplan.toml")]
  config: PathBuf,

  /// SQLite file to use instead of the configured `store_path`.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  // Tracing writes to stderr; stdout carries command output.
  let default_level: Directive = cfg.log_level.parse().unwrap_or_else(|_| LevelFilter::WARN.into());
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level)
        .from_env_lossy(),
    )
    .init();

  let store_path = cli.store.as_deref().map_or(cfg.store_path, expand_tilde);
  let medium = SqliteMedium::open(&store_path)
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let mut planner = Planner::new(medium);

  commands::run(&mut planner, cli.command, &mut io::stdout().lock())
}
