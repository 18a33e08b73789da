//! Teams, their organization role and their membership.

use aquayman_core::TeamConfig;

use crate::error::SyncError;
use crate::pipeline::Run;
use crate::report::{Action, Target};

pub(crate) fn sync_teams(run: &mut Run<'_>) -> Result<(), SyncError> {
    let org = run.org();
    let config = run.config;

    let live = run.read(format!("teams of {org}"), |c| c.list_teams(org))?;

    for team in &config.teams {
        let current = live.iter().find(|t| t.name == team.name);
        let upsert = match current {
            None => Some((Action::Create, format!("role {}", team.role))),
            Some(t) if t.role != team.role => {
                Some((Action::Update, format!("role {} → {}", t.role, team.role)))
            }
            Some(t) if t.description != team.description => {
                Some((Action::Update, "description".to_string()))
            }
            Some(_) => None,
        };
        if let Some((action, detail)) = upsert {
            run.apply(action, Target::Team(team.name.clone()), Some(detail), |c| {
                c.upsert_team(org, &team.name, team.role, &team.description)
            })?;
        }
        sync_members(run, team)?;
    }

    for team in &live {
        if config.team(&team.name).is_some() {
            continue;
        }
        run.apply(Action::Delete, Target::Team(team.name.clone()), None, |c| {
            c.delete_team(org, &team.name)
        })?;
    }
    Ok(())
}

/// Removes undeclared members, then adds missing ones. Pending invitations
/// count as present.
fn sync_members(run: &mut Run<'_>, team: &TeamConfig) -> Result<(), SyncError> {
    let org = run.org();

    // A dry run may be planning a team that does not exist yet.
    let current = if run.is_dry() {
        Vec::new()
    } else {
        run.read(format!("members of team {}", team.name), |c| {
            c.list_team_members(org, &team.name, true)
        })?
    };

    for member in &current {
        if team.members.contains(&member.name) {
            continue;
        }
        let target = Target::TeamMember {
            team: team.name.clone(),
            member: member.name.clone(),
        };
        run.apply(Action::Delete, target, None, |c| {
            c.remove_team_member(org, &team.name, &member.name)
        })?;
    }

    for member in &team.members {
        if current.iter().any(|m| &m.name == member) {
            continue;
        }
        let target = Target::TeamMember {
            team: team.name.clone(),
            member: member.clone(),
        };
        run.apply(Action::Create, target, None, |c| {
            c.add_team_member(org, &team.name, member)
        })?;
    }
    Ok(())
}
