//! What a run changed, or would have changed on a dry client.

use std::fmt;

use chrono::{DateTime, Utc};

use aquayman_quay::PermissionKind;

use crate::error::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn marker(self) -> char {
        match self {
            Action::Create => '+',
            Action::Update => '~',
            Action::Delete => '-',
        }
    }

    pub(crate) fn verb(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// The entity a change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Robot(String),
    /// A robot's credential in the external secret store.
    Secret(String),
    Team(String),
    TeamMember { team: String, member: String },
    Repository(String),
    Permission {
        repo: String,
        kind: PermissionKind,
        name: String,
    },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Robot(name) => write!(f, "robot {name}"),
            Target::Secret(robot) => write!(f, "published secret of robot {robot}"),
            Target::Team(name) => write!(f, "team {name}"),
            Target::TeamMember { team, member } => write!(f, "member {member} of team {team}"),
            Target::Repository(name) => write!(f, "repository {name}"),
            Target::Permission { repo, kind, name } => write!(f, "{kind} {name} on {repo}"),
        }
    }
}

/// One create/update/delete issued against the registry or secret store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub phase: Phase,
    pub action: Action,
    pub target: Target,
    /// Human-readable specifics, e.g. the new role.
    pub detail: Option<String>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action.marker(), self.target)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub organization: String,
    /// The client was dry: nothing in `changes` was actually applied.
    pub dry_run: bool,
    pub changes: Vec<Change>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn is_converged(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes_in(&self, phase: Phase) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.phase == phase)
    }

    pub fn count(&self, phase: Phase, action: Action) -> usize {
        self.changes_in(phase).filter(|c| c.action == action).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_display() {
        let change = Change {
            phase: Phase::Repositories,
            action: Action::Update,
            target: Target::Permission {
                repo: "acme/app".into(),
                kind: PermissionKind::Team,
                name: "devs".into(),
            },
            detail: Some("read → admin".into()),
        };
        assert_eq!(change.to_string(), "~ team devs on acme/app (read → admin)");
    }

    #[test]
    fn member_display() {
        let target = Target::TeamMember {
            team: "platform".into(),
            member: "bob".into(),
        };
        assert_eq!(target.to_string(), "member bob of team platform");
    }
}
