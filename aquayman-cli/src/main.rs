//! Aquayman — manage quay.io organization permissions as code.
//!
//! # Usage
//!
//! ```text
//! aquayman validate --config <file> [--check-names]
//! aquayman sync --config <file> [--confirm] [--create-repos] [--delete-repos] [--enable-vault] [--deadline <secs>]
//! aquayman export --config <file>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{export::ExportArgs, sync::SyncArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "aquayman",
    version,
    about = "Reconcile quay.io teams, robots and repository permissions with a YAML file",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a configuration file and exit.
    Validate(ValidateArgs),

    /// Bring the organization in line with a configuration file.
    Sync(SyncArgs),

    /// Overwrite a configuration file with the organization's live state.
    Export(ExportArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Export(args) => args.run(),
    }
}
