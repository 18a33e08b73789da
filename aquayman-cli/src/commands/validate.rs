//! `aquayman validate` — offline checks, optionally confirming user names online.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::{load_config, registry_client};

/// Arguments for `aquayman validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the organization's config.yaml.
    #[arg(long)]
    pub config: PathBuf,

    /// Also check that every referenced user exists (needs $AQUAYMAN_TOKEN).
    #[arg(long)]
    pub check_names: bool,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(&self.config)?;

        if self.check_names {
            let client = registry_client(true)?;
            aquayman_sync::check_names(&config, &client).context("configuration is invalid")?;
        }

        println!("{} Configuration is valid.", "✓".green());
        Ok(())
    }
}
