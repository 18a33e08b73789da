//! `aquayman export` — replace a config file with what is live.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::registry_client;

/// Arguments for `aquayman export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Config file to overwrite. Only its `organization` is read, and the file
    /// does not need to be valid otherwise.
    #[arg(long)]
    pub config: PathBuf,
}

impl ExportArgs {
    pub fn run(self) -> Result<()> {
        let current = aquayman_core::load_from_file(&self.config)
            .with_context(|| format!("failed to load config {}", self.config.display()))?;
        let client = registry_client(true)?;

        log::info!("exporting organization {}", current.organization);
        let exported = aquayman_sync::export_configuration(&current.organization, &client)
            .context("failed to export")?;
        aquayman_core::save_to_file(&exported, &self.config)
            .context("failed to update config file")?;

        println!(
            "{} Exported {} robots, {} teams and {} repositories to {}",
            "✓".green(),
            exported.robots.len(),
            exported.teams.len(),
            exported.repositories.len(),
            self.config.display()
        );
        Ok(())
    }
}
