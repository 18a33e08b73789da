//! Error types for aquayman-sync.

use std::fmt;

use thiserror::Error;

use aquayman_publisher::PublishError;
use aquayman_quay::QuayError;

/// The three reconciliation passes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Robots,
    Teams,
    Repositories,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[Phase::Robots, Phase::Teams, Phase::Repositories]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Robots => f.write_str("robots"),
            Phase::Teams => f.write_str("teams"),
            Phase::Repositories => f.write_str("repositories"),
        }
    }
}

/// The single error a failed run reports.
///
/// Always names the phase, and the entity being processed where there is one,
/// so an operator knows where the run stopped before re-running it.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to sync {phase}: failed to {action} {entity}: {source}")]
    Registry {
        phase: Phase,
        action: &'static str,
        entity: String,
        #[source]
        source: QuayError,
    },

    #[error("failed to sync {phase}: failed to {action} {entity}: {source}")]
    Publish {
        phase: Phase,
        action: &'static str,
        entity: String,
        #[source]
        source: PublishError,
    },

    #[error("failed to sync {phase}: run was cancelled")]
    Cancelled { phase: Phase },

    #[error("failed to export {what}: {source}")]
    Export {
        what: &'static str,
        #[source]
        source: QuayError,
    },

    #[error("{kind} {name:?} referenced by {referrer} does not exist: {source}")]
    UnknownUser {
        kind: &'static str,
        name: String,
        referrer: String,
        #[source]
        source: QuayError,
    },
}

impl SyncError {
    /// The phase a reconciliation error happened in.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SyncError::Registry { phase, .. }
            | SyncError::Publish { phase, .. }
            | SyncError::Cancelled { phase } => Some(*phase),
            SyncError::Export { .. } | SyncError::UnknownUser { .. } => None,
        }
    }
}
