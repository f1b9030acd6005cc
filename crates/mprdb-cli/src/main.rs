//! `mprdb`: command-line client for a reputation node.
//!
//! Reads `mprdb.toml` (or the path given with `--config`) layered under
//! `MPRDB_*` environment variables, opens the node's SQLite store and runs
//! one command.
//!
//! # Usage
//!
//! ```text
//! mprdb keygen
//! mprdb trust --uuid <source> --pubkey peer.key --level 3 --name lobby
//! mprdb submit --player <uuid> --points -2 --comment "x-ray mining"
//! mprdb update --at-most -1 --export banned-players.json
//! ```

mod commands;
mod export;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::NodeConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mprdb", version, about = "Player reputation node")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "mprdb.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Generate this node's signing key pair.
  Keygen {
    /// Replace existing key files.
    #[arg(long)]
    force: bool,
  },

  /// Trust a remote source's assertions.
  Trust {
    /// The source's node id.
    #[arg(long)]
    uuid: Uuid,

    /// File holding the source's armored OpenPGP public key.
    #[arg(long, value_name = "FILE")]
    pubkey: PathBuf,

    /// Trust level from 1 (barely) to 5 (fully).
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=5))]
    level: i64,

    /// Display label; defaults to the uuid.
    #[arg(long)]
    name: Option<String>,
  },

  /// List trusted sources in registration order.
  Sources,

  /// Sign and publish an assertion about a player.
  Submit {
    #[arg(long)]
    player: Uuid,

    #[arg(long, allow_hyphen_values = true)]
    points: f64,

    #[arg(long)]
    comment: String,
  },

  /// Withdraw one of this node's published assertions.
  Retract {
    #[arg(long)]
    operation: Uuid,

    #[arg(long)]
    comment: String,
  },

  /// List assertions this node has published.
  Submissions,

  /// Rebuild the aggregate from every trusted source and print it.
  Update {
    /// Only show subjects scoring at or below this value.
    #[arg(long, allow_hyphen_values = true)]
    at_most: Option<f64>,

    /// Also write the shown subjects to a ban-list file.
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
  },

  /// Print the current aggregate without rebuilding.
  Report {
    #[arg(long, allow_hyphen_values = true)]
    at_most: Option<f64>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = NodeConfig::load(&cli.config)?;

  match cli.command {
    Command::Keygen { force } => commands::keygen(&cfg, force),
    Command::Trust { uuid, pubkey, level, name } => {
      commands::trust(&cfg, uuid, &pubkey, level, name).await
    }
    Command::Sources => commands::sources(&cfg).await,
    Command::Submit { player, points, comment } => {
      commands::submit(&cfg, player, points, comment).await
    }
    Command::Retract { operation, comment } => {
      commands::retract(&cfg, operation, comment).await
    }
    Command::Submissions => commands::submissions(&cfg).await,
    Command::Update { at_most, export } => {
      commands::update(&cfg, at_most, export.as_deref()).await
    }
    Command::Report { at_most } => commands::report(&cfg, at_most).await,
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Cli::command().debug_assert(); }

  #[test]
  fn negative_points_parse() {
    let player = Uuid::new_v4().to_string();
    let cli = Cli::try_parse_from([
      "mprdb", "submit", "--player", player.as_str(), "--points", "-2.5", "--comment",
      "griefing",
    ])
    .unwrap();
    assert!(matches!(cli.command, Command::Submit { points, .. } if points == -2.5));
  }

  #[test]
  fn trust_level_out_of_range_is_refused() {
    let source = Uuid::new_v4().to_string();
    let r = Cli::try_parse_from([
      "mprdb", "trust", "--uuid", source.as_str(), "--pubkey", "k", "--level", "6",
    ]);
    assert!(r.is_err());
  }
}
