//! Builds an organization document from live state.

use std::collections::BTreeMap;

use aquayman_core::{Config, RepositoryConfig, RepositoryRole, RobotConfig, TeamConfig};
use aquayman_quay::{PermissionKind, QuayError, RegistryClient};

use crate::error::SyncError;

/// Reads robots, repositories and teams of `organization` into a [`Config`].
///
/// The result is a starting point for managing an existing organization: it
/// declares exactly what is live, so syncing it back issues no changes.
/// Published-secret addresses cannot be recovered and are left unset.
pub fn export_configuration(
    organization: &str,
    client: &dyn RegistryClient,
) -> Result<Config, SyncError> {
    let mut config = Config {
        organization: organization.to_string(),
        ..Config::default()
    };

    tracing::info!("exporting robots");
    config.robots = client
        .list_robots(organization, false)
        .map_err(wrap("robots"))?
        .into_iter()
        .map(|robot| RobotConfig {
            name: robot.short_name().to_string(),
            description: robot.description,
            ..RobotConfig::default()
        })
        .collect();

    tracing::info!("exporting repositories");
    let repos = client
        .list_repositories(organization)
        .map_err(wrap("repositories"))?;
    for repo in repos {
        let full_name = repo.full_name();
        let teams = grants(client, &full_name, PermissionKind::Team)?;
        let users = grants(client, &full_name, PermissionKind::User)?;
        tracing::debug!("exported {full_name} ({})", repo.visibility());

        config.repositories.push(RepositoryConfig {
            visibility: repo.visibility(),
            name: repo.name,
            description: repo.description,
            teams,
            users,
        });
    }

    tracing::info!("exporting teams");
    let teams = client.list_teams(organization).map_err(wrap("teams"))?;
    for team in teams {
        let mut members: Vec<String> = client
            .list_team_members(organization, &team.name, true)
            .map_err(wrap("team members"))?
            .into_iter()
            .map(|m| m.name)
            .collect();
        members.sort();

        config.teams.push(TeamConfig {
            name: team.name,
            role: team.role,
            description: team.description,
            members,
        });
    }

    Ok(config)
}

fn grants(
    client: &dyn RegistryClient,
    full_name: &str,
    kind: PermissionKind,
) -> Result<BTreeMap<String, RepositoryRole>, SyncError> {
    Ok(client
        .list_repository_permissions(full_name, kind)
        .map_err(wrap("repository permissions"))?
        .into_iter()
        .map(|p| (p.name, p.role))
        .collect())
}

fn wrap(what: &'static str) -> impl Fn(QuayError) -> SyncError {
    move |source| SyncError::Export { what, source }
}
