//! Online check that every human user a document names exists.

use aquayman_core::{is_robot_username, Config};
use aquayman_quay::RegistryClient;

use crate::error::SyncError;

/// Looks up every team member and every repository user grantee.
///
/// Robots are skipped here; whether they are declared is already part of
/// offline validation. Stops at the first name the registry does not know.
pub fn check_names(config: &Config, client: &dyn RegistryClient) -> Result<(), SyncError> {
    for team in &config.teams {
        for member in team.members.iter().filter(|m| !is_robot_username(m)) {
            client.get_user(member).map_err(|source| SyncError::UnknownUser {
                kind: "user",
                name: member.clone(),
                referrer: format!("team {}", team.name),
                source,
            })?;
        }
    }

    for repo in &config.repositories {
        for user in repo.users.keys().filter(|u| !is_robot_username(u)) {
            client.get_user(user).map_err(|source| SyncError::UnknownUser {
                kind: "user",
                name: user.clone(),
                referrer: format!("repository {}", repo.name),
                source,
            })?;
        }
    }
    Ok(())
}
