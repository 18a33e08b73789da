//! Desired-state types for an aquayman organization document.
//!
//! Everything here is plain data: loaded once per run, never mutated by the
//! reconcilers. All types are serializable/deserializable via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between organization and short name in a robot account name.
pub const ROBOT_SEPARATOR: char = '+';

/// Characters that turn a repository rule name into a glob pattern.
pub const GLOB_META: &[char] = &['*', '?', '['];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Organization-wide role granted to every member of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Inherits all permissions of the team.
    #[default]
    Member,
    /// Member and can create new repositories.
    Creator,
    /// Full admin access to the organization.
    Admin,
}

impl TeamRole {
    pub fn all() -> &'static [TeamRole] {
        &[TeamRole::Member, TeamRole::Creator, TeamRole::Admin]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TeamRole::Member => "member",
            TeamRole::Creator => "creator",
            TeamRole::Admin => "admin",
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission level a team or user holds on a single repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryRole {
    /// Can view and pull from the repository.
    #[default]
    Read,
    /// Can view, pull and push to the repository.
    Write,
    /// Full admin access, pull and push on the repository.
    Admin,
}

impl RepositoryRole {
    pub fn all() -> &'static [RepositoryRole] {
        &[RepositoryRole::Read, RepositoryRole::Write, RepositoryRole::Admin]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RepositoryRole::Read => "read",
            RepositoryRole::Write => "write",
            RepositoryRole::Admin => "admin",
        }
    }
}

impl fmt::Display for RepositoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A team and its membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    pub role: TeamRole,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Usernames, or robot accounts written `org+name` exactly as the registry
    /// lists them in team membership. The short form used under `robots` is not
    /// accepted here. In declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// A robot account, always declared by its short name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RobotConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Where to publish the robot's token, as `path` or `path#key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_secret: Option<String>,
    /// Never create this robot; delete it (and its published secret) if it exists.
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
}

/// A repository rule. The name is either a literal repository name or a glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub teams: BTreeMap<String, RepositoryRole>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub users: BTreeMap<String, RepositoryRole>,
}

impl RepositoryConfig {
    /// Wildcard rules apply to existing repositories only and are never created.
    pub fn is_wildcard(&self) -> bool {
        self.name.contains(GLOB_META)
    }
}

/// Root of an organization document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    pub organization: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<TeamConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<RepositoryConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub robots: Vec<RobotConfig>,
}

impl Config {
    pub fn team(&self, name: &str) -> Option<&TeamConfig> {
        self.teams.iter().find(|t| t.name == name)
    }

    /// Looks up a robot by short name, including robots marked `deleted`.
    pub fn robot(&self, short_name: &str) -> Option<&RobotConfig> {
        self.robots.iter().find(|r| r.name == short_name)
    }
}

// ---------------------------------------------------------------------------
// Robot naming
// ---------------------------------------------------------------------------

/// `org+short`.
pub fn robot_full_name(organization: &str, short_name: &str) -> String {
    format!("{organization}{ROBOT_SEPARATOR}{short_name}")
}

/// Strips the organization prefix from a robot account name, if present.
pub fn robot_short_name(name: &str) -> &str {
    name.split_once(ROBOT_SEPARATOR)
        .map_or(name, |(_, short)| short)
}

/// Grantees without the `org+` prefix are human users.
pub fn is_robot_username(name: &str) -> bool {
    name.contains(ROBOT_SEPARATOR)
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_display_matches_serde() {
        for role in RepositoryRole::all() {
            let yaml = serde_yaml::to_string(role).expect("serialize");
            assert_eq!(yaml.trim(), role.to_string());
        }
        assert_eq!(TeamRole::Creator.to_string(), "creator");
        assert_eq!(Visibility::Public.to_string(), "public");
    }

    #[test]
    fn wildcard_detection() {
        let mut repo = RepositoryConfig {
            name: "app".into(),
            visibility: Visibility::Private,
            description: String::new(),
            teams: BTreeMap::new(),
            users: BTreeMap::new(),
        };
        assert!(!repo.is_wildcard());
        for name in ["app-*", "app-?", "app-[ab]"] {
            repo.name = name.into();
            assert!(repo.is_wildcard(), "{name} should be a wildcard");
        }
    }

    #[test]
    fn robot_names() {
        assert_eq!(robot_full_name("acme", "ci"), "acme+ci");
        assert_eq!(robot_short_name("acme+ci"), "ci");
        assert_eq!(robot_short_name("ci"), "ci");
        assert!(is_robot_username("acme+ci"));
        assert!(!is_robot_username("alice"));
    }

    #[test]
    fn robot_deleted_flag_is_omitted_when_false() {
        let robot = RobotConfig {
            name: "ci".into(),
            ..RobotConfig::default()
        };
        let yaml = serde_yaml::to_string(&robot).expect("serialize");
        assert!(!yaml.contains("deleted"));
        assert!(!yaml.contains("vaultSecret"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = serde_yaml::from_str::<TeamConfig>("name: a\nrole: owner\n");
        assert!(err.is_err());
    }
}
