//! Error types for the GitLab API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by [`crate::IssueApi`] implementations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GitLab answered with a non-success status
    #[error("GitLab returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode GitLab response: {0}")]
    Decode(String),

    /// Client could not be configured
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// HTTP status carried by this error, if GitLab produced one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Decode(_) | Self::InvalidConfig(_) => None,
        }
    }
}

/// Result alias for GitLab API calls.
pub type ApiResult<T> = Result<T, ApiError>;
