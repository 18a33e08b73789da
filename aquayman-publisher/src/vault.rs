//! Vault KV v2 publisher.
//!
//! Each robot with a `vaultSecret` address gets two fields in the secret at
//! that path: `<key>-token` holds the raw token, `<key>-config` a ready-to-use
//! Docker `config.json`. Other fields in the same secret are left alone.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use aquayman_core::{robot_full_name, RobotConfig};

use crate::error::PublishError;
use crate::Publisher;

pub const ADDR_ENV: &str = "VAULT_ADDR";
pub const TOKEN_ENV: &str = "VAULT_TOKEN";

/// Registry host written into generated Docker configs.
pub const REGISTRY_HOST: &str = "quay.io";

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct VaultPublisher {
    agent: ureq::Agent,
    addr: String,
    token: String,
    organization: String,
}

/// Where a robot's fields live: the secret path and the field-name prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Address {
    pub path: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    #[serde(default)]
    data: Option<SecretData>,
}

#[derive(Debug, Deserialize)]
struct SecretData {
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

#[derive(Serialize)]
struct DockerConfig {
    auths: BTreeMap<String, DockerAuth>,
}

#[derive(Serialize)]
struct DockerAuth {
    auth: String,
    email: String,
}

impl VaultPublisher {
    pub fn new(addr: &str, token: &str, organization: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            addr: addr.trim_end_matches('/').to_string(),
            token: token.to_string(),
            organization: organization.to_string(),
        }
    }

    /// Reads `VAULT_ADDR` and `VAULT_TOKEN`.
    pub fn from_env(organization: &str) -> Result<Self, PublishError> {
        let addr = non_empty_env(ADDR_ENV)?;
        let token = non_empty_env(TOKEN_ENV)?;
        Ok(Self::new(&addr, &token, organization))
    }

    pub(crate) fn address(&self, robot: &RobotConfig) -> Result<Option<Address>, PublishError> {
        let Some(secret) = robot.vault_secret.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let parts: Vec<&str> = secret.split('#').collect();
        match parts.as_slice() {
            [path] => Ok(Some(Address {
                path: path.to_string(),
                key: format!("{REGISTRY_HOST}-{}-{}", self.organization, robot.name),
            })),
            [path, key] => Ok(Some(Address {
                path: path.to_string(),
                key: key.to_string(),
            })),
            _ => Err(PublishError::InvalidAddress(format!(
                "invalid path {secret:?}: must not contain more than one # symbol"
            ))),
        }
    }

    /// Pretty-printed Docker `config.json` authenticating as the robot.
    pub(crate) fn docker_config(&self, robot: &RobotConfig, token: &str) -> Result<String, PublishError> {
        let login = format!("{}:{token}", robot_full_name(&self.organization, &robot.name));
        let config = DockerConfig {
            auths: BTreeMap::from([(
                REGISTRY_HOST.to_string(),
                DockerAuth {
                    auth: STANDARD.encode(login),
                    email: String::new(),
                },
            )]),
        };
        let mut rendered = serde_json::to_string_pretty(&config)?;
        rendered.push('\n');
        Ok(rendered)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.addr, path.trim_start_matches('/'))
    }

    /// Current fields of the secret, or `None` if it does not exist yet.
    fn read(&self, path: &str) -> Result<Option<Map<String, Value>>, PublishError> {
        let response = match self
            .agent
            .get(&self.url(path))
            .set("X-Vault-Token", &self.token)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(e) => {
                return Err(PublishError::Read {
                    path: path.to_string(),
                    source: Box::new(e),
                })
            }
        };
        let secret: SecretResponse = response.into_json().map_err(PublishError::Decode)?;
        Ok(Some(
            secret
                .data
                .and_then(|d| d.data)
                .unwrap_or_default(),
        ))
    }

    fn write(&self, path: &str, data: Map<String, Value>) -> Result<(), PublishError> {
        self.agent
            .post(&self.url(path))
            .set("X-Vault-Token", &self.token)
            .send_json(json!({ "data": data }))
            .map_err(|e| PublishError::Write {
                path: path.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }
}

impl Publisher for VaultPublisher {
    fn update_robot(&self, robot: &RobotConfig, token: &str) -> Result<(), PublishError> {
        let Some(addr) = self.address(robot)? else {
            return Ok(());
        };

        let config = self.docker_config(robot, token)?;
        let token_field = format!("{}-token", addr.key);
        let config_field = format!("{}-config", addr.key);

        let mut data = self.read(&addr.path)?.unwrap_or_default();
        let up_to_date = data.get(&token_field).and_then(Value::as_str) == Some(token)
            && data.get(&config_field).and_then(Value::as_str) == Some(config.as_str());
        if up_to_date {
            tracing::debug!("secret for robot {} is up to date", robot.name);
            return Ok(());
        }

        data.insert(token_field, Value::String(token.to_string()));
        data.insert(config_field, Value::String(config));
        self.write(&addr.path, data)?;
        tracing::info!("published token for robot {} to {}", robot.name, addr.path);
        Ok(())
    }

    fn delete_robot(&self, robot: &RobotConfig) -> Result<(), PublishError> {
        let Some(addr) = self.address(robot)? else {
            return Ok(());
        };
        let Some(mut data) = self.read(&addr.path)? else {
            return Ok(());
        };

        let token_field = format!("{}-token", addr.key);
        if data.remove(&token_field).is_none() {
            return Ok(());
        }
        data.remove(&format!("{}-config", addr.key));
        self.write(&addr.path, data)?;
        tracing::info!("removed published token for robot {} from {}", robot.name, addr.path);
        Ok(())
    }
}

fn non_empty_env(name: &'static str) -> Result<String, PublishError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(PublishError::MissingEnv(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot(secret: Option<&str>) -> RobotConfig {
        RobotConfig {
            name: "ci".into(),
            vault_secret: secret.map(str::to_string),
            ..RobotConfig::default()
        }
    }

    fn publisher() -> VaultPublisher {
        VaultPublisher::new("http://vault:8200/", "t", "acme")
    }

    #[test]
    fn address_defaults_key() {
        let addr = publisher().address(&robot(Some("secret/data/quay"))).expect("addr");
        assert_eq!(
            addr,
            Some(Address {
                path: "secret/data/quay".into(),
                key: "quay.io-acme-ci".into(),
            })
        );
    }

    #[test]
    fn address_with_explicit_key() {
        let addr = publisher().address(&robot(Some("secret/data/quay#pusher"))).expect("addr");
        assert_eq!(addr.map(|a| a.key), Some("pusher".to_string()));
    }

    #[test]
    fn address_rejects_two_hashes() {
        assert!(publisher().address(&robot(Some("a#b#c"))).is_err());
    }

    #[test]
    fn no_address_without_secret() {
        assert_eq!(publisher().address(&robot(None)).expect("addr"), None);
        assert_eq!(publisher().address(&robot(Some(""))).expect("addr"), None);
    }

    #[test]
    fn docker_config_embeds_robot_login() {
        let rendered = publisher().docker_config(&robot(None), "tok").expect("config");
        let parsed: Value = serde_json::from_str(&rendered).expect("json");
        let auth = parsed["auths"]["quay.io"]["auth"].as_str().expect("auth");
        let decoded = STANDARD.decode(auth).expect("base64");
        assert_eq!(decoded, b"acme+ci:tok");
        assert!(rendered.ends_with("}\n"));
        assert!(rendered.contains("\n  \"auths\""));
    }

    #[test]
    fn url_joins_cleanly() {
        assert_eq!(publisher().url("/secret/data/x"), "http://vault:8200/v1/secret/data/x");
    }
}
