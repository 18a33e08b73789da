//! Error types for aquayman-quay.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Structured error body returned by the registry API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiError {
    pub status: u16,
    pub error_message: String,
    pub title: String,
    pub error_type: String,
    pub detail: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Undocumented; only set for some conflicts, such as adding a user to a
    /// team they are already a member of.
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return f.write_str(&self.message);
        }
        write!(f, "{}: {}", self.title, self.error_message)
    }
}

impl std::error::Error for ApiError {}

/// All errors a registry call can produce.
#[derive(Debug, Error)]
pub enum QuayError {
    /// The registry rejected the request and explained why.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Non-success status whose body could not be decoded.
    #[error("request failed with HTTP status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Network failure, timeout, TLS error.
    #[error("request failed: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    #[error("failed to decode response: {0}")]
    Decode(#[source] std::io::Error),

    #[error("no OAuth2 token provided")]
    MissingToken,
}

impl QuayError {
    /// Shorthand for registry-style rejections raised outside an HTTP exchange.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        QuayError::Api(ApiError {
            status,
            message: message.into(),
            ..ApiError::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wins_over_title() {
        let err = ApiError {
            title: "conflict".into(),
            error_message: "already there".into(),
            message: "User is already a member".into(),
            ..ApiError::default()
        };
        assert_eq!(err.to_string(), "User is already a member");
    }

    #[test]
    fn title_and_error_message_otherwise() {
        let err: ApiError =
            serde_json::from_str(r#"{"status":404,"title":"not_found","error_message":"Not Found"}"#)
                .expect("decode");
        assert_eq!(err.to_string(), "not_found: Not Found");
        assert_eq!(err.status, 404);
    }
}
