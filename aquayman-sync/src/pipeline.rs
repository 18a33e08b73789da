//! Shared sync pipeline entrypoint and the per-run context every phase uses.

use chrono::Utc;

use aquayman_core::Config;
use aquayman_publisher::{PublishError, Publisher};
use aquayman_quay::{QuayError, RegistryClient};

use crate::cancel::Cancellation;
use crate::error::{Phase, SyncError};
use crate::report::{Action, Change, SyncReport, Target};
use crate::{repositories, robots, teams};

/// Knobs for a single run. The default touches no repository that is not
/// already declared and live, and publishes nothing.
#[derive(Clone, Default)]
pub struct SyncOptions<'a> {
    /// Create repositories declared by a literal (non-wildcard) rule but
    /// missing from the registry.
    pub create_missing_repositories: bool,
    /// Delete live repositories no rule matches.
    pub delete_dangling_repositories: bool,
    /// Where robot tokens are published.
    pub publisher: Option<&'a dyn Publisher>,
    pub cancel: Cancellation,
}

/// Converge `client`'s organization onto `config`.
///
/// Phases run robots, teams, repositories. The first error stops the run and
/// is returned with its phase and entity; whatever was applied before it
/// stays applied.
pub fn sync(
    config: &Config,
    client: &dyn RegistryClient,
    options: &SyncOptions<'_>,
) -> Result<SyncReport, SyncError> {
    let started_at = Utc::now();
    let mut run = Run::new(config, client, options);

    for phase in Phase::all() {
        run.phase = *phase;
        tracing::info!("{}syncing {phase}", run.prefix());
        match phase {
            Phase::Robots => robots::sync_robots(&mut run)?,
            Phase::Teams => teams::sync_teams(&mut run)?,
            Phase::Repositories => repositories::sync_repositories(&mut run)?,
        }
    }

    Ok(SyncReport {
        organization: config.organization.clone(),
        dry_run: client.is_dry(),
        changes: run.changes,
        started_at,
        finished_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

/// State threaded through the phases of one run.
pub(crate) struct Run<'a> {
    pub config: &'a Config,
    pub client: &'a dyn RegistryClient,
    pub options: &'a SyncOptions<'a>,
    pub phase: Phase,
    pub changes: Vec<Change>,
}

impl<'a> Run<'a> {
    fn new(config: &'a Config, client: &'a dyn RegistryClient, options: &'a SyncOptions<'a>) -> Self {
        Self {
            config,
            client,
            options,
            phase: Phase::Robots,
            changes: Vec::new(),
        }
    }

    pub fn org(&self) -> &'a str {
        &self.config.organization
    }

    pub fn is_dry(&self) -> bool {
        self.client.is_dry()
    }

    pub fn prefix(&self) -> &'static str {
        if self.is_dry() {
            "[dry-run] "
        } else {
            ""
        }
    }

    /// A registry read, wrapped with the phase and what was being listed.
    pub fn read<T>(
        &self,
        entity: impl Into<String>,
        call: impl FnOnce(&dyn RegistryClient) -> Result<T, QuayError>,
    ) -> Result<T, SyncError> {
        self.options.cancel.check(self.phase)?;
        call(self.client).map_err(|source| SyncError::Registry {
            phase: self.phase,
            action: "list",
            entity: entity.into(),
            source,
        })
    }

    /// A registry mutation. Logged before it is issued, recorded once it
    /// succeeded (or was suppressed by a dry client).
    pub fn apply(
        &mut self,
        action: Action,
        target: Target,
        detail: Option<String>,
        call: impl FnOnce(&dyn RegistryClient) -> Result<(), QuayError>,
    ) -> Result<(), SyncError> {
        self.options.cancel.check(self.phase)?;
        let change = Change {
            phase: self.phase,
            action,
            target,
            detail,
        };
        tracing::info!("{}{change}", self.prefix());

        call(self.client).map_err(|source| SyncError::Registry {
            phase: self.phase,
            action: action.verb(),
            entity: change.target.to_string(),
            source,
        })?;
        self.changes.push(change);
        Ok(())
    }

    /// A publisher call. Never reached on a dry client.
    pub fn publish(
        &self,
        action: &'static str,
        robot: &str,
        call: impl FnOnce(&dyn Publisher) -> Result<(), PublishError>,
    ) -> Result<(), SyncError> {
        let Some(publisher) = self.options.publisher else {
            return Ok(());
        };
        self.options.cancel.check(self.phase)?;
        call(publisher).map_err(|source| SyncError::Publish {
            phase: self.phase,
            action,
            entity: format!("token of robot {robot}"),
            source,
        })
    }

    pub fn record(&mut self, change: Change) {
        tracing::info!("{}{change}", self.prefix());
        self.changes.push(change);
    }
}
