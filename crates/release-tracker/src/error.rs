//! Error types for the release tracker.

use gitlab_api::{ApiError, ProjectRef};
use thiserror::Error;

/// Errors produced while marking releases on the parent project.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// GitLab request failed (after the client's own retries)
    #[error(transparent)]
    Api(#[from] ApiError),

    /// More than one open tracking issue carries the label.
    ///
    /// A human has to close the duplicates; retrying cannot help.
    #[error(
        "Found {count} open tracking issues in parent project {project}; \
         keep the latest one, close the others and retry"
    )]
    MultipleTrackingIssuesFound { count: usize, project: ProjectRef },

    /// Tracking issue description is not a module/version mapping
    #[error("Tracking issue description is not a module/version mapping: {0}")]
    MalformedDescription(String),

    /// Version map could not be serialized
    #[error("Failed to serialize version map: {0}")]
    Encode(#[from] serde_yaml::Error),

    /// The issue kept changing underneath every merge attempt
    #[error("Tracking issue #{iid} was modified concurrently on each of {attempts} attempts")]
    ConcurrentModification { iid: u64, attempts: u32 },

    /// The version map was written but the release note could not be posted
    #[error("Tracking issue #{iid} updated, but posting the release note failed: {source}")]
    Announce {
        iid: u64,
        #[source]
        source: ApiError,
    },

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrackerError {
    /// Whether running the pipeline again can succeed without human action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(_) | Self::ConcurrentModification { .. } | Self::Announce { .. } => true,
            Self::MultipleTrackingIssuesFound { .. }
            | Self::MalformedDescription(_)
            | Self::Encode(_)
            | Self::Config(_) => false,
        }
    }
}

/// Result alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
