//! `crumb` — drive the consent ledger and profile store against a cookie
//! jar kept on disk.
//!
//! # Usage
//!
//! ```text
//! crumb status
//! crumb save --functional true --analytics false
//! crumb update --display-name Ann --set newsletter=true
//! crumb --config ./crumb.toml track play --data track='"intro"'
//! ```
//!
//! The jar is loaded before the command runs and written back afterwards,
//! so consecutive invocations behave like page loads in one browser.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use crumb_consent::ConsentProvider;
use crumb_jar::{JarSnapshot, MemoryJar};
use settings::Settings;
use tracing::debug;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Cookie consent ledger and profile store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "crumb.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let settings = Settings::load(&cli.config)?;
  debug!(?settings, "settings loaded");

  let snapshot = JarSnapshot::load(&settings.jar_path)
    .with_context(|| format!("failed to load jar from {}", settings.jar_path.display()))?;
  let jar = MemoryJar::from_snapshot(settings.location.clone(), snapshot);

  let outcome = {
    let mut provider = ConsentProvider::with_attributes(&jar, settings.cookies.clone());
    commands::run(&mut provider, cli.command)
  };

  jar
    .snapshot()
    .save(&settings.jar_path)
    .with_context(|| format!("failed to save jar to {}", settings.jar_path.display()))?;

  outcome
}
