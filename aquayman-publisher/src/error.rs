//! Error types for aquayman-publisher.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid configuration: {0}")]
    InvalidAddress(String),

    #[error("environment variable {0} must be set")]
    MissingEnv(&'static str),

    #[error("failed to read from Vault at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to update Vault at {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to decode Vault response: {0}")]
    Decode(#[source] std::io::Error),

    #[error("failed to create Docker config: {0}")]
    DockerConfig(#[from] serde_json::Error),
}
