//! Blocking HTTP implementation of [`RegistryClient`] for the quay.io API.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use aquayman_core::{RepositoryRole, TeamRole, Visibility};

use crate::client::RegistryClient;
use crate::error::{ApiError, QuayError};
use crate::types::{
    CreateRepository, Permission, PermissionKind, Repository, Robot, Team, TeamMember, User,
};

pub const DEFAULT_BASE_URL: &str = "https://quay.io/api/v1";

/// Applies to connect, read and write of every single call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// quay.io API client.
///
/// The dry flag is fixed at construction: a dry client sends every GET and
/// answers every other method with success without touching the network.
#[derive(Debug, Clone)]
pub struct QuayClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    dry: bool,
}

impl QuayClient {
    pub fn new(token: &str, dry: bool) -> Result<Self, QuayError> {
        Self::with_base_url(DEFAULT_BASE_URL, token, DEFAULT_TIMEOUT, dry)
    }

    pub fn with_base_url(
        base_url: &str,
        token: &str,
        timeout: Duration,
        dry: bool,
    ) -> Result<Self, QuayError> {
        if token.is_empty() {
            return Err(QuayError::MissingToken);
        }
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            dry,
        })
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{path}", self.base_url))
            .set("Authorization", &format!("Bearer {}", self.token))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, QuayError> {
        let request = query
            .iter()
            .fold(self.request("GET", path), |req, (k, v)| req.query(k, v));
        let response = request.call().map_err(from_ureq)?;
        response.into_json().map_err(QuayError::Decode)
    }

    fn mutate(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), QuayError> {
        if self.dry {
            tracing::debug!("[dry-run] skipped {method} {path}");
            return Ok(());
        }
        let request = self.request(method, path);
        match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        }
        .map_err(from_ureq)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RobotsResponse {
    #[serde(default)]
    robots: Vec<Robot>,
}

#[derive(Deserialize)]
struct OrganizationResponse {
    #[serde(default)]
    teams: BTreeMap<String, Team>,
    #[serde(default)]
    ordered_teams: Vec<String>,
}

#[derive(Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<TeamMember>,
}

#[derive(Deserialize)]
struct RepositoriesResponse {
    #[serde(default)]
    repositories: Vec<Repository>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Deserialize)]
struct PermissionsResponse {
    #[serde(default)]
    permissions: BTreeMap<String, Permission>,
}

// ---------------------------------------------------------------------------
// RegistryClient
// ---------------------------------------------------------------------------

impl RegistryClient for QuayClient {
    fn is_dry(&self) -> bool {
        self.dry
    }

    fn list_robots(&self, org: &str, include_tokens: bool) -> Result<Vec<Robot>, QuayError> {
        let path = format!("/organization/{}/robots", esc(org));
        let token = if include_tokens { "true" } else { "false" };
        let mut robots = self.get::<RobotsResponse>(&path, &[("token", token)])?.robots;
        robots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(robots)
    }

    fn create_robot(&self, org: &str, short_name: &str, description: &str) -> Result<(), QuayError> {
        let path = format!("/organization/{}/robots/{}", esc(org), esc(short_name));
        self.mutate("PUT", &path, Some(json!({ "description": description })))
    }

    fn delete_robot(&self, org: &str, short_name: &str) -> Result<(), QuayError> {
        let path = format!("/organization/{}/robots/{}", esc(org), esc(short_name));
        self.mutate("DELETE", &path, None)
    }

    fn list_teams(&self, org: &str) -> Result<Vec<Team>, QuayError> {
        let path = format!("/organization/{}", esc(org));
        let OrganizationResponse {
            mut teams,
            ordered_teams,
        } = self.get(&path, &[])?;
        Ok(ordered_teams
            .iter()
            .filter_map(|name| teams.remove(name))
            .collect())
    }

    fn upsert_team(
        &self,
        org: &str,
        team: &str,
        role: TeamRole,
        description: &str,
    ) -> Result<(), QuayError> {
        let path = format!("/organization/{}/team/{}", esc(org), esc(team));
        let body = json!({ "role": role, "description": description });
        self.mutate("PUT", &path, Some(body))
    }

    fn delete_team(&self, org: &str, team: &str) -> Result<(), QuayError> {
        let path = format!("/organization/{}/team/{}", esc(org), esc(team));
        self.mutate("DELETE", &path, None)
    }

    fn list_team_members(
        &self,
        org: &str,
        team: &str,
        include_pending: bool,
    ) -> Result<Vec<TeamMember>, QuayError> {
        let path = format!("/organization/{}/team/{}/members", esc(org), esc(team));
        let pending = if include_pending { "true" } else { "false" };
        Ok(self
            .get::<MembersResponse>(&path, &[("includePending", pending)])?
            .members)
    }

    fn add_team_member(&self, org: &str, team: &str, member: &str) -> Result<(), QuayError> {
        let path = member_path(org, team, member);
        self.mutate("PUT", &path, None)
    }

    fn remove_team_member(&self, org: &str, team: &str, member: &str) -> Result<(), QuayError> {
        let path = member_path(org, team, member);
        self.mutate("DELETE", &path, None)
    }

    fn list_repositories(&self, namespace: &str) -> Result<Vec<Repository>, QuayError> {
        let mut repositories = Vec::new();
        let mut next_page: Option<String> = None;
        loop {
            let mut query = vec![("namespace", namespace)];
            if let Some(page) = next_page.as_deref() {
                query.push(("next_page", page));
            }
            let page = self.get::<RepositoriesResponse>("/repository", &query)?;
            repositories.extend(page.repositories);
            match page.next_page {
                Some(token) if !token.is_empty() => next_page = Some(token),
                _ => break,
            }
        }
        repositories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repositories)
    }

    fn create_repository(&self, repo: &CreateRepository) -> Result<(), QuayError> {
        let body = json!({
            "repo_kind": "image",
            "namespace": repo.namespace,
            "repository": repo.repository,
            "visibility": repo.visibility,
            "description": repo.description,
        });
        self.mutate("POST", "/repository", Some(body))
    }

    fn update_repository_description(
        &self,
        full_name: &str,
        description: &str,
    ) -> Result<(), QuayError> {
        let path = format!("/repository/{full_name}");
        self.mutate("PUT", &path, Some(json!({ "description": description })))
    }

    fn change_repository_visibility(
        &self,
        full_name: &str,
        visibility: Visibility,
    ) -> Result<(), QuayError> {
        let path = format!("/repository/{full_name}/changevisibility");
        self.mutate("POST", &path, Some(json!({ "visibility": visibility })))
    }

    fn delete_repository(&self, full_name: &str) -> Result<(), QuayError> {
        self.mutate("DELETE", &format!("/repository/{full_name}"), None)
    }

    fn list_repository_permissions(
        &self,
        full_name: &str,
        kind: PermissionKind,
    ) -> Result<Vec<Permission>, QuayError> {
        // the trailing slash is required by the API
        let path = format!("/repository/{full_name}/permissions/{kind}/");
        let response = self.get::<PermissionsResponse>(&path, &[])?;
        Ok(response.permissions.into_values().collect())
    }

    fn set_repository_permission(
        &self,
        full_name: &str,
        kind: PermissionKind,
        name: &str,
        role: RepositoryRole,
    ) -> Result<(), QuayError> {
        let path = format!("/repository/{full_name}/permissions/{kind}/{}", esc(name));
        self.mutate("PUT", &path, Some(json!({ "role": role })))
    }

    fn remove_repository_permission(
        &self,
        full_name: &str,
        kind: PermissionKind,
        name: &str,
    ) -> Result<(), QuayError> {
        let path = format!("/repository/{full_name}/permissions/{kind}/{}", esc(name));
        self.mutate("DELETE", &path, None)
    }

    fn get_user(&self, username: &str) -> Result<User, QuayError> {
        self.get(&format!("/users/{}", esc(username)), &[])
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn esc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn member_path(org: &str, team: &str, member: &str) -> String {
    format!(
        "/organization/{}/team/{}/members/{}",
        esc(org),
        esc(team),
        esc(member)
    )
}

fn from_ureq(err: ureq::Error) -> QuayError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            match serde_json::from_str::<ApiError>(&body) {
                Ok(mut api) if !(api.message.is_empty() && api.title.is_empty()) => {
                    if api.status == 0 {
                        api.status = status;
                    }
                    QuayError::Api(api)
                }
                _ => QuayError::Status {
                    status,
                    detail: body,
                },
            }
        }
        ureq::Error::Transport(transport) => QuayError::Transport(Box::new(transport)),
    }
}
