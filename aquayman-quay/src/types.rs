//! Live-state records as reported by the registry API.
//!
//! Snapshots only: every reconciler pass fetches these fresh and drops them
//! when it is done.

use std::fmt;

use serde::{Deserialize, Serialize};

use aquayman_core::{robot_short_name, RepositoryRole, TeamRole, Visibility};

/// A robot account. `name` is fully qualified (`org+short`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Robot {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Only populated when listing with tokens.
    #[serde(default)]
    pub token: String,
}

impl Robot {
    pub fn short_name(&self) -> &str {
        robot_short_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub role: TeamRole,
    #[serde(default)]
    pub description: String,
}

/// A confirmed member or a pending invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub invited: bool,
    #[serde(default)]
    pub is_robot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl Repository {
    /// `namespace/name`, the form every per-repository endpoint takes.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_public(self.is_public)
    }
}

/// One grant on a repository, for either a team or a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub role: RepositoryRole,
}

/// Which grant table a permission call addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    Team,
    User,
}

impl PermissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionKind::Team => "team",
            PermissionKind::User => "user",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments for creating a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepository {
    pub namespace: String,
    pub repository: String,
    pub visibility: Visibility,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub username: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robot_short_name_strips_org() {
        let robot = Robot {
            name: "acme+ci".into(),
            description: String::new(),
            token: String::new(),
        };
        assert_eq!(robot.short_name(), "ci");
    }

    #[test]
    fn repository_null_description_decodes_empty() {
        let repo: Repository = serde_json::from_str(
            r#"{"namespace":"acme","name":"app","is_public":true,"description":null}"#,
        )
        .expect("decode");
        assert_eq!(repo.description, "");
        assert_eq!(repo.full_name(), "acme/app");
        assert_eq!(repo.visibility(), Visibility::Public);
    }
}
