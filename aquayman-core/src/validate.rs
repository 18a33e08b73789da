//! Structural validation of an organization document.
//!
//! Runs before any registry call. Checks that need the registry (do the named
//! users exist?) live in `aquayman-sync`.

use std::collections::HashSet;

use crate::error::{invalid, ConfigError};
use crate::types::{is_robot_username, robot_full_name, Config, ROBOT_SEPARATOR};

const ROBOT_NAME_MAX: usize = 255;

impl Config {
    /// Returns the first problem found, in document order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.organization.is_empty() {
            return Err(invalid("no organization configured"));
        }

        let mut team_names = HashSet::new();
        for team in &self.teams {
            if !team_names.insert(team.name.as_str()) {
                return Err(invalid(format!("duplicate team {:?} defined", team.name)));
            }
        }

        let prefix = format!("{}{ROBOT_SEPARATOR}", self.organization);
        let mut robot_names = HashSet::new();
        for robot in &self.robots {
            if let Some(short) = robot.name.strip_prefix(&prefix) {
                return Err(invalid(format!(
                    "robot {:?} must be given as a short name, without the organization prefix (must be {short:?})",
                    robot.name
                )));
            }
            if !valid_robot_name(&robot.name) {
                return Err(invalid(format!(
                    "robot {:?} has an invalid name, must be alphanumeric lowercase",
                    robot.name
                )));
            }
            if !robot_names.insert(robot.name.as_str()) {
                return Err(invalid(format!("duplicate robot {:?} defined", robot.name)));
            }
            if let Some(secret) = &robot.vault_secret {
                if secret.matches('#').count() > 1 {
                    return Err(invalid(format!(
                        "invalid secret address {secret:?} for robot {:?}: must not contain more than one # symbol",
                        robot.name
                    )));
                }
            }
        }

        let mut repo_names = HashSet::new();
        for repo in &self.repositories {
            if !repo_names.insert(repo.name.as_str()) {
                return Err(invalid(format!("duplicate repository {:?} defined", repo.name)));
            }

            if repo.is_wildcard() {
                if let Err(e) = glob::Pattern::new(&repo.name) {
                    return Err(invalid(format!(
                        "repository pattern {:?} is invalid: {e}",
                        repo.name
                    )));
                }
            }

            for team in repo.teams.keys() {
                if !team_names.contains(team.as_str()) {
                    return Err(invalid(format!(
                        "invalid team {team:?} assigned to repo {:?}: team does not exist",
                        repo.name
                    )));
                }
            }

            for user in repo.users.keys().filter(|u| is_robot_username(u)) {
                let declared = self
                    .robots
                    .iter()
                    .find(|r| robot_full_name(&self.organization, &r.name) == *user);
                match declared {
                    None => {
                        return Err(invalid(format!(
                            "invalid robot {user:?} assigned to repo {:?}: robot does not exist",
                            repo.name
                        )))
                    }
                    Some(robot) if robot.deleted => {
                        return Err(invalid(format!(
                            "invalid robot {user:?} assigned to repo {:?}: robot is marked as deleted",
                            repo.name
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }
}

/// `^[a-z][a-z0-9_]{1,254}$`
fn valid_robot_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let len = name.len();
    first_ok
        && (2..=ROBOT_NAME_MAX).contains(&len)
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
