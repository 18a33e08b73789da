//! The registry capability the reconcilers are written against.

use aquayman_core::{RepositoryRole, TeamRole, Visibility};

use crate::error::QuayError;
use crate::types::{
    CreateRepository, Permission, PermissionKind, Repository, Robot, Team, TeamMember, User,
};

/// Every registry operation aquayman needs.
///
/// Implementations are constructed either live or dry. A dry client performs
/// every read normally and turns every mutating call into a successful no-op,
/// so a reconciliation pass against it computes and reports the full plan.
///
/// Listings are returned in a stable order (by name) so diffs are deterministic.
pub trait RegistryClient {
    /// Whether mutating calls are suppressed.
    fn is_dry(&self) -> bool;

    /// Robot names are fully qualified. Tokens are only fetched when asked
    /// for, since that is a more expensive call.
    fn list_robots(&self, org: &str, include_tokens: bool) -> Result<Vec<Robot>, QuayError>;
    fn create_robot(&self, org: &str, short_name: &str, description: &str)
        -> Result<(), QuayError>;
    fn delete_robot(&self, org: &str, short_name: &str) -> Result<(), QuayError>;

    /// Teams in the registry's own order.
    fn list_teams(&self, org: &str) -> Result<Vec<Team>, QuayError>;
    fn upsert_team(
        &self,
        org: &str,
        team: &str,
        role: TeamRole,
        description: &str,
    ) -> Result<(), QuayError>;
    fn delete_team(&self, org: &str, team: &str) -> Result<(), QuayError>;

    fn list_team_members(
        &self,
        org: &str,
        team: &str,
        include_pending: bool,
    ) -> Result<Vec<TeamMember>, QuayError>;
    fn add_team_member(&self, org: &str, team: &str, member: &str) -> Result<(), QuayError>;
    fn remove_team_member(&self, org: &str, team: &str, member: &str) -> Result<(), QuayError>;

    /// All repositories in `namespace`, across every page, sorted by name.
    fn list_repositories(&self, namespace: &str) -> Result<Vec<Repository>, QuayError>;
    fn create_repository(&self, repo: &CreateRepository) -> Result<(), QuayError>;
    fn update_repository_description(
        &self,
        full_name: &str,
        description: &str,
    ) -> Result<(), QuayError>;
    fn change_repository_visibility(
        &self,
        full_name: &str,
        visibility: Visibility,
    ) -> Result<(), QuayError>;
    fn delete_repository(&self, full_name: &str) -> Result<(), QuayError>;

    /// Succeeds with an empty list for a repository that does not exist.
    fn list_repository_permissions(
        &self,
        full_name: &str,
        kind: PermissionKind,
    ) -> Result<Vec<Permission>, QuayError>;
    /// Grants or overwrites a role.
    fn set_repository_permission(
        &self,
        full_name: &str,
        kind: PermissionKind,
        name: &str,
        role: RepositoryRole,
    ) -> Result<(), QuayError>;
    fn remove_repository_permission(
        &self,
        full_name: &str,
        kind: PermissionKind,
        name: &str,
    ) -> Result<(), QuayError>;

    fn get_user(&self, username: &str) -> Result<User, QuayError>;
}
