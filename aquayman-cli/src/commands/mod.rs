pub mod export;
pub mod sync;
pub mod validate;

use std::path::Path;

use anyhow::{bail, Context, Result};

use aquayman_core::Config;
use aquayman_quay::QuayClient;

pub const TOKEN_ENV: &str = "AQUAYMAN_TOKEN";

/// Reads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = aquayman_core::load_from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    config.validate().context("configuration is invalid")?;
    Ok(config)
}

/// A quay.io client authenticated from the environment. `dry` suppresses every
/// mutating call.
pub fn registry_client(dry: bool) -> Result<QuayClient> {
    let token = std::env::var(TOKEN_ENV).unwrap_or_default();
    if token.is_empty() {
        bail!("no OAuth2 token specified in ${TOKEN_ENV}");
    }
    QuayClient::new(&token, dry).context("failed to create quay.io API client")
}
