//! In-memory registry.
//!
//! Behaves like the live API for everything aquayman calls, including the dry
//! flag, and keeps a log of every mutating call it was asked to perform
//! (whether or not dry mode suppressed it). Used by the engine's tests and
//! for offline plan previews.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use aquayman_core::{robot_full_name, RepositoryRole, TeamRole, Visibility};

use crate::client::RegistryClient;
use crate::error::QuayError;
use crate::types::{
    CreateRepository, Permission, PermissionKind, Repository, Robot, Team, TeamMember, User,
};

/// A mutating call, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateRobot { name: String, description: String },
    DeleteRobot { name: String },
    UpsertTeam { team: String, role: TeamRole, description: String },
    DeleteTeam { team: String },
    AddTeamMember { team: String, member: String },
    RemoveTeamMember { team: String, member: String },
    CreateRepository(CreateRepository),
    UpdateRepositoryDescription { repo: String, description: String },
    ChangeRepositoryVisibility { repo: String, visibility: Visibility },
    DeleteRepository { repo: String },
    SetPermission { repo: String, kind: PermissionKind, name: String, role: RepositoryRole },
    RemovePermission { repo: String, kind: PermissionKind, name: String },
}

/// Everything the registry knows about one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub organization: String,
    /// Keyed by fully-qualified robot name.
    pub robots: BTreeMap<String, Robot>,
    /// In registry order.
    pub teams: Vec<Team>,
    pub members: BTreeMap<String, Vec<TeamMember>>,
    /// Keyed by `namespace/name`.
    pub repositories: BTreeMap<String, Repository>,
    pub team_permissions: BTreeMap<String, BTreeMap<String, RepositoryRole>>,
    pub user_permissions: BTreeMap<String, BTreeMap<String, RepositoryRole>>,
    /// Known user accounts, for `get_user`.
    pub users: BTreeSet<String>,
}

impl RegistryState {
    pub fn new(organization: &str) -> Self {
        Self {
            organization: organization.to_string(),
            ..Self::default()
        }
    }

    pub fn with_robot(mut self, short_name: &str, description: &str) -> Self {
        let name = robot_full_name(&self.organization, short_name);
        let token = token_for(&name);
        self.robots.insert(
            name.clone(),
            Robot {
                name,
                description: description.to_string(),
                token,
            },
        );
        self
    }

    pub fn with_team(mut self, name: &str, role: TeamRole, members: &[&str]) -> Self {
        self.teams.push(Team {
            name: name.to_string(),
            role,
            description: String::new(),
        });
        self.members.insert(
            name.to_string(),
            members.iter().map(|m| member(m, false)).collect(),
        );
        self
    }

    /// Adds an invitation that has not been accepted yet.
    pub fn with_pending_member(mut self, team: &str, name: &str) -> Self {
        self.members
            .entry(team.to_string())
            .or_default()
            .push(member(name, true));
        self
    }

    pub fn with_repository(mut self, name: &str, visibility: Visibility, description: &str) -> Self {
        let repo = Repository {
            namespace: self.organization.clone(),
            name: name.to_string(),
            is_public: visibility.is_public(),
            description: description.to_string(),
        };
        self.repositories.insert(repo.full_name(), repo);
        self
    }

    pub fn with_permission(
        mut self,
        repo: &str,
        kind: PermissionKind,
        name: &str,
        role: RepositoryRole,
    ) -> Self {
        let full = format!("{}/{repo}", self.organization);
        self.grants_mut(kind)
            .entry(full)
            .or_default()
            .insert(name.to_string(), role);
        self
    }

    pub fn with_user(mut self, name: &str) -> Self {
        self.users.insert(name.to_string());
        self
    }

    fn grants(&self, kind: PermissionKind) -> &BTreeMap<String, BTreeMap<String, RepositoryRole>> {
        match kind {
            PermissionKind::Team => &self.team_permissions,
            PermissionKind::User => &self.user_permissions,
        }
    }

    fn grants_mut(
        &mut self,
        kind: PermissionKind,
    ) -> &mut BTreeMap<String, BTreeMap<String, RepositoryRole>> {
        match kind {
            PermissionKind::Team => &mut self.team_permissions,
            PermissionKind::User => &mut self.user_permissions,
        }
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<(), QuayError> {
        match mutation {
            Mutation::CreateRobot { name, description } => {
                let full = robot_full_name(&self.organization, name);
                if self.robots.contains_key(&full) {
                    return Err(QuayError::api(400, format!("Existing robot with name: {full}")));
                }
                let token = token_for(&full);
                self.robots.insert(
                    full.clone(),
                    Robot {
                        name: full,
                        description: description.clone(),
                        token,
                    },
                );
            }
            Mutation::DeleteRobot { name } => {
                let full = robot_full_name(&self.organization, name);
                self.robots
                    .remove(&full)
                    .ok_or_else(|| not_found("robot", &full))?;
            }
            Mutation::UpsertTeam {
                team,
                role,
                description,
            } => match self.teams.iter_mut().find(|t| t.name == *team) {
                Some(existing) => {
                    existing.role = *role;
                    existing.description = description.clone();
                }
                None => {
                    self.teams.push(Team {
                        name: team.clone(),
                        role: *role,
                        description: description.clone(),
                    });
                    self.members.insert(team.clone(), Vec::new());
                }
            },
            Mutation::DeleteTeam { team } => {
                let before = self.teams.len();
                self.teams.retain(|t| t.name != *team);
                if self.teams.len() == before {
                    return Err(not_found("team", team));
                }
                self.members.remove(team);
                for grants in self.team_permissions.values_mut() {
                    grants.remove(team);
                }
            }
            Mutation::AddTeamMember { team, member: name } => {
                let members = self
                    .members
                    .get_mut(team)
                    .ok_or_else(|| not_found("team", team))?;
                if members.iter().any(|m| m.name == *name) {
                    return Err(QuayError::api(400, "User is already a member of the team"));
                }
                members.push(member(name, false));
            }
            Mutation::RemoveTeamMember { team, member: name } => {
                let members = self
                    .members
                    .get_mut(team)
                    .ok_or_else(|| not_found("team", team))?;
                let before = members.len();
                members.retain(|m| m.name != *name);
                if members.len() == before {
                    return Err(not_found("team member", name));
                }
            }
            Mutation::CreateRepository(create) => {
                let repo = Repository {
                    namespace: create.namespace.clone(),
                    name: create.repository.clone(),
                    is_public: create.visibility.is_public(),
                    description: create.description.clone(),
                };
                let full = repo.full_name();
                if self.repositories.contains_key(&full) {
                    return Err(QuayError::api(400, "Repository already exists"));
                }
                self.repositories.insert(full, repo);
            }
            Mutation::UpdateRepositoryDescription { repo, description } => {
                self.repository_mut(repo)?.description = description.clone();
            }
            Mutation::ChangeRepositoryVisibility { repo, visibility } => {
                self.repository_mut(repo)?.is_public = visibility.is_public();
            }
            Mutation::DeleteRepository { repo } => {
                self.repositories
                    .remove(repo)
                    .ok_or_else(|| not_found("repository", repo))?;
                self.team_permissions.remove(repo);
                self.user_permissions.remove(repo);
            }
            Mutation::SetPermission {
                repo,
                kind,
                name,
                role,
            } => {
                self.repository_mut(repo)?;
                self.grants_mut(*kind)
                    .entry(repo.clone())
                    .or_default()
                    .insert(name.clone(), *role);
            }
            Mutation::RemovePermission { repo, kind, name } => {
                self.grants_mut(*kind)
                    .get_mut(repo)
                    .and_then(|grants| grants.remove(name))
                    .ok_or_else(|| not_found("permission", name))?;
            }
        }
        Ok(())
    }

    fn repository_mut(&mut self, full_name: &str) -> Result<&mut Repository, QuayError> {
        self.repositories
            .get_mut(full_name)
            .ok_or_else(|| not_found("repository", full_name))
    }
}

/// A [`RegistryClient`] backed by a [`RegistryState`].
#[derive(Debug)]
pub struct MemoryRegistry {
    dry: bool,
    state: RefCell<RegistryState>,
    mutations: RefCell<Vec<Mutation>>,
    reads: RefCell<Vec<String>>,
    fail_on: Option<Mutation>,
}

impl MemoryRegistry {
    pub fn new(state: RegistryState) -> Self {
        Self::build(state, false)
    }

    /// A registry whose mutating calls are logged but never applied.
    pub fn dry(state: RegistryState) -> Self {
        Self::build(state, true)
    }

    fn build(state: RegistryState, dry: bool) -> Self {
        Self {
            dry,
            state: RefCell::new(state),
            mutations: RefCell::new(Vec::new()),
            reads: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Makes the given call fail with a registry error instead of applying.
    pub fn failing_on(mut self, mutation: Mutation) -> Self {
        self.fail_on = Some(mutation);
        self
    }

    /// A copy of the current state.
    pub fn state(&self) -> RegistryState {
        self.state.borrow().clone()
    }

    /// Every mutating call received so far, in order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.borrow().clone()
    }

    pub fn clear_mutations(&self) {
        self.mutations.borrow_mut().clear();
    }

    /// Names of the read operations performed so far, in order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.borrow().clone()
    }

    fn read(&self, operation: &str) {
        self.reads.borrow_mut().push(operation.to_string());
    }

    fn mutate(&self, mutation: Mutation) -> Result<(), QuayError> {
        self.mutations.borrow_mut().push(mutation.clone());
        if self.dry {
            return Ok(());
        }
        if self.fail_on.as_ref() == Some(&mutation) {
            return Err(QuayError::api(500, "injected failure"));
        }
        self.state.borrow_mut().apply(&mutation)
    }
}

impl RegistryClient for MemoryRegistry {
    fn is_dry(&self) -> bool {
        self.dry
    }

    fn list_robots(&self, org: &str, include_tokens: bool) -> Result<Vec<Robot>, QuayError> {
        self.read(if include_tokens { "list_robots_with_tokens" } else { "list_robots" });
        let state = self.state.borrow();
        check_org(&state, org)?;
        Ok(state
            .robots
            .values()
            .map(|r| Robot {
                token: if include_tokens { r.token.clone() } else { String::new() },
                ..r.clone()
            })
            .collect())
    }

    fn create_robot(&self, _org: &str, short_name: &str, description: &str) -> Result<(), QuayError> {
        self.mutate(Mutation::CreateRobot {
            name: short_name.to_string(),
            description: description.to_string(),
        })
    }

    fn delete_robot(&self, _org: &str, short_name: &str) -> Result<(), QuayError> {
        self.mutate(Mutation::DeleteRobot {
            name: short_name.to_string(),
        })
    }

    fn list_teams(&self, org: &str) -> Result<Vec<Team>, QuayError> {
        self.read("list_teams");
        let state = self.state.borrow();
        check_org(&state, org)?;
        Ok(state.teams.clone())
    }

    fn upsert_team(
        &self,
        _org: &str,
        team: &str,
        role: TeamRole,
        description: &str,
    ) -> Result<(), QuayError> {
        self.mutate(Mutation::UpsertTeam {
            team: team.to_string(),
            role,
            description: description.to_string(),
        })
    }

    fn delete_team(&self, _org: &str, team: &str) -> Result<(), QuayError> {
        self.mutate(Mutation::DeleteTeam {
            team: team.to_string(),
        })
    }

    fn list_team_members(
        &self,
        org: &str,
        team: &str,
        include_pending: bool,
    ) -> Result<Vec<TeamMember>, QuayError> {
        self.read("list_team_members");
        let state = self.state.borrow();
        check_org(&state, org)?;
        let members = state
            .members
            .get(team)
            .ok_or_else(|| not_found("team", team))?;
        Ok(members
            .iter()
            .filter(|m| include_pending || !m.invited)
            .cloned()
            .collect())
    }

    fn add_team_member(&self, _org: &str, team: &str, member: &str) -> Result<(), QuayError> {
        self.mutate(Mutation::AddTeamMember {
            team: team.to_string(),
            member: member.to_string(),
        })
    }

    fn remove_team_member(&self, _org: &str, team: &str, member: &str) -> Result<(), QuayError> {
        self.mutate(Mutation::RemoveTeamMember {
            team: team.to_string(),
            member: member.to_string(),
        })
    }

    fn list_repositories(&self, namespace: &str) -> Result<Vec<Repository>, QuayError> {
        self.read("list_repositories");
        let state = self.state.borrow();
        let mut repos: Vec<Repository> = state
            .repositories
            .values()
            .filter(|r| r.namespace == namespace)
            .cloned()
            .collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    fn create_repository(&self, repo: &CreateRepository) -> Result<(), QuayError> {
        self.mutate(Mutation::CreateRepository(repo.clone()))
    }

    fn update_repository_description(
        &self,
        full_name: &str,
        description: &str,
    ) -> Result<(), QuayError> {
        self.mutate(Mutation::UpdateRepositoryDescription {
            repo: full_name.to_string(),
            description: description.to_string(),
        })
    }

    fn change_repository_visibility(
        &self,
        full_name: &str,
        visibility: Visibility,
    ) -> Result<(), QuayError> {
        self.mutate(Mutation::ChangeRepositoryVisibility {
            repo: full_name.to_string(),
            visibility,
        })
    }

    fn delete_repository(&self, full_name: &str) -> Result<(), QuayError> {
        self.mutate(Mutation::DeleteRepository {
            repo: full_name.to_string(),
        })
    }

    fn list_repository_permissions(
        &self,
        full_name: &str,
        kind: PermissionKind,
    ) -> Result<Vec<Permission>, QuayError> {
        self.read("list_repository_permissions");
        let state = self.state.borrow();
        Ok(state
            .grants(kind)
            .get(full_name)
            .map(|grants| {
                grants
                    .iter()
                    .map(|(name, role)| Permission {
                        name: name.clone(),
                        role: *role,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn set_repository_permission(
        &self,
        full_name: &str,
        kind: PermissionKind,
        name: &str,
        role: RepositoryRole,
    ) -> Result<(), QuayError> {
        self.mutate(Mutation::SetPermission {
            repo: full_name.to_string(),
            kind,
            name: name.to_string(),
            role,
        })
    }

    fn remove_repository_permission(
        &self,
        full_name: &str,
        kind: PermissionKind,
        name: &str,
    ) -> Result<(), QuayError> {
        self.mutate(Mutation::RemovePermission {
            repo: full_name.to_string(),
            kind,
            name: name.to_string(),
        })
    }

    fn get_user(&self, username: &str) -> Result<User, QuayError> {
        self.read("get_user");
        if self.state.borrow().users.contains(username) {
            Ok(User {
                username: username.to_string(),
            })
        } else {
            Err(not_found("user", username))
        }
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn token_for(full_name: &str) -> String {
    format!("{full_name}-token")
}

fn member(name: &str, invited: bool) -> TeamMember {
    TeamMember {
        name: name.to_string(),
        kind: "user".to_string(),
        invited,
        is_robot: aquayman_core::is_robot_username(name),
    }
}

fn not_found(what: &str, name: &str) -> QuayError {
    QuayError::api(404, format!("{what} {name:?} not found"))
}

fn check_org(state: &RegistryState, org: &str) -> Result<(), QuayError> {
    if state.organization == org {
        Ok(())
    } else {
        Err(not_found("organization", org))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RegistryState {
        RegistryState::new("acme")
            .with_robot("ci", "pushes")
            .with_team("devs", TeamRole::Member, &["alice"])
            .with_pending_member("devs", "bob")
            .with_repository("app", Visibility::Private, "")
    }

    #[test]
    fn dry_registry_logs_but_does_not_apply() {
        let registry = MemoryRegistry::dry(state());
        registry.delete_robot("acme", "ci").expect("delete");
        registry.delete_repository("acme/app").expect("delete");
        assert_eq!(registry.mutations().len(), 2);
        assert_eq!(registry.state(), state());
    }

    #[test]
    fn live_registry_applies() {
        let registry = MemoryRegistry::new(state());
        registry.delete_robot("acme", "ci").expect("delete");
        assert!(registry.state().robots.is_empty());
    }

    #[test]
    fn pending_members_only_listed_on_request() {
        let registry = MemoryRegistry::new(state());
        let confirmed = registry.list_team_members("acme", "devs", false).expect("list");
        let all = registry.list_team_members("acme", "devs", true).expect("list");
        assert_eq!(confirmed.len(), 1);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn permissions_of_missing_repository_are_empty() {
        let registry = MemoryRegistry::new(state());
        let grants = registry
            .list_repository_permissions("acme/ghost", PermissionKind::Team)
            .expect("list");
        assert!(grants.is_empty());
    }

    #[test]
    fn tokens_only_returned_on_request() {
        let registry = MemoryRegistry::new(state());
        let without = registry.list_robots("acme", false).expect("list");
        let with = registry.list_robots("acme", true).expect("list");
        assert!(without[0].token.is_empty());
        assert_eq!(with[0].token, "acme+ci-token");
    }

    #[test]
    fn injected_failure_is_not_applied() {
        let fail = Mutation::DeleteRobot { name: "ci".into() };
        let registry = MemoryRegistry::new(state()).failing_on(fail);
        assert!(registry.delete_robot("acme", "ci").is_err());
        assert_eq!(registry.state().robots.len(), 1);
    }
}
