//! `aquayman sync` — plan, and with `--confirm` apply, the changes a config
//! file implies.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::{ColoredString, Colorize};
use tabled::{settings::Style, Table, Tabled};

use aquayman_publisher::{Publisher, VaultPublisher};
use aquayman_sync::{Action, Cancellation, Change, Phase, SyncOptions, SyncReport};

use super::{load_config, registry_client};

/// Arguments for `aquayman sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the organization's config.yaml.
    #[arg(long)]
    pub config: PathBuf,

    /// Actually perform the changes. Without it every change is only planned.
    #[arg(long)]
    pub confirm: bool,

    /// Create repositories listed in the config but missing on quay.io.
    #[arg(long)]
    pub create_repos: bool,

    /// Delete repositories on quay.io that no rule in the config matches.
    #[arg(long)]
    pub delete_repos: bool,

    /// Publish robot tokens to Vault ($VAULT_ADDR and $VAULT_TOKEN).
    #[arg(long)]
    pub enable_vault: bool,

    /// Stop before the next API call once this many seconds have passed.
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(&self.config)?;

        let vault = if self.enable_vault {
            Some(
                VaultPublisher::from_env(&config.organization)
                    .context("failed to create Vault client")?,
            )
        } else {
            None
        };
        let client = registry_client(!self.confirm)?;

        let options = SyncOptions {
            create_missing_repositories: self.create_repos,
            delete_dangling_repositories: self.delete_repos,
            publisher: vault.as_ref().map(|v| v as &dyn Publisher),
            cancel: self
                .deadline
                .map(|secs| Cancellation::with_timeout(Duration::from_secs(secs)))
                .unwrap_or_default(),
        };

        log::info!("updating organization {}", config.organization);
        let report = aquayman_sync::sync(&config, &client, &options)
            .context("failed to sync state")?;

        print_report(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct PhaseRow {
    #[tabled(rename = "phase")]
    phase: String,
    #[tabled(rename = "created")]
    created: usize,
    #[tabled(rename = "updated")]
    updated: usize,
    #[tabled(rename = "deleted")]
    deleted: usize,
}

fn print_report(report: &SyncReport) {
    if report.is_converged() {
        println!(
            "{} Organization {} is up to date.",
            "✓".green(),
            report.organization
        );
        return;
    }

    for change in &report.changes {
        println!("  {}", colorize(change));
    }
    println!();

    let rows: Vec<PhaseRow> = Phase::all()
        .iter()
        .map(|&phase| PhaseRow {
            phase: phase.to_string(),
            created: report.count(phase, Action::Create),
            updated: report.count(phase, Action::Update),
            deleted: report.count(phase, Action::Delete),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let elapsed = report.finished_at - report.started_at;
    if report.dry_run {
        println!(
            "{} {} changes planned. Run again with --confirm to apply them.",
            "⚠".yellow(),
            report.changes.len()
        );
    } else {
        println!(
            "{} {} changes applied in {:.1}s.",
            "✓".green(),
            report.changes.len(),
            elapsed.num_milliseconds() as f64 / 1000.0
        );
    }
}

fn colorize(change: &Change) -> ColoredString {
    let line = change.to_string();
    match change.action {
        Action::Create => line.green(),
        Action::Update => line.yellow(),
        Action::Delete => line.red(),
    }
}
