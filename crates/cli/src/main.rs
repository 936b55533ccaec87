mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shipshape_lib::config::ReleaseConfig;
use shipshape_lib::consts::CONFIG_FILENAME;

use crate::output::{OutputFormat, print_error};

/// ship - publish releases without rebuilding unchanged binaries
#[derive(Parser)]
#[command(name = "ship")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the release configuration
  #[arg(short, long, global = true, default_value = CONFIG_FILENAME)]
  config: PathBuf,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the content fingerprint of the source tree
  Hash,

  /// Show what publishing a version would do, without writing
  Check {
    /// Version to check (e.g. 1.4.2)
    version: String,

    /// Reuse the latest binaries even if the fingerprint changed
    #[arg(long)]
    force_reuse: bool,
  },

  /// Publish a release
  Publish {
    /// Version to publish (e.g. 1.4.2)
    version: String,

    /// One-line release summary
    #[arg(long)]
    summary: Option<String>,

    /// Longer release notes
    #[arg(long)]
    description: Option<String>,

    /// Reuse the latest binaries even if the fingerprint changed
    #[arg(long)]
    force_reuse: bool,

    /// Also write the updated binary mapping to this local file
    #[arg(long)]
    mapping_out: Option<PathBuf>,
  },

  /// Show the latest release and verify the binary mapping
  Status,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let config = ReleaseConfig::load(&cli.config)
    .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

  match cli.command {
    Commands::Hash => cmd::cmd_hash(&config, cli.output),
    Commands::Check { version, force_reuse } => cmd::cmd_check(&config, &version, force_reuse, cli.output),
    Commands::Publish {
      version,
      summary,
      description,
      force_reuse,
      mapping_out,
    } => cmd::cmd_publish(
      &config,
      cmd::PublishArgs {
        version,
        summary,
        description,
        force_reuse,
        mapping_out,
      },
      cli.output,
    ),
    Commands::Status => cmd::cmd_status(&config, cli.output),
  }
}
