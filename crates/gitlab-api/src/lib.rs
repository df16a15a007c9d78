//! GitLab issue API client.
//!
//! This crate is the transport layer for the release tracker: it executes
//! authenticated requests against a GitLab-compatible REST API and retries
//! transient failures a bounded number of times. It knows nothing about
//! version maps or tracking issues.
//!
//! # Usage
//!
//! ```no_run
//! use gitlab_api::{GitLabClient, IssueApi, IssueQuery, ProjectRef, RetryPolicy};
//!
//! # async fn run() -> Result<(), gitlab_api::ApiError> {
//! let client = GitLabClient::builder("https://gitlab.com/api/v4", "glpat-...")
//!     .retry(RetryPolicy::with_limit(3))
//!     .build()?;
//!
//! let issues = client
//!     .list_issues(
//!         &ProjectRef::new("group/parent"),
//!         &IssueQuery::open_with_label("submodule_released"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`IssueApi`] is the seam callers depend on
//! - [`GitLabClient`] implements it over `reqwest`
//! - [`RetryPolicy`] bounds retries of transient failures; `POST` is never resent

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod models;
pub mod project;
pub mod retry;

pub use client::{GitLabClient, GitLabClientBuilder};
pub use error::{ApiError, ApiResult};
pub use models::{Issue, IssueQuery, IssueState, IssueUpdate, NewIssue, NewNote, Note};
pub use project::ProjectRef;
pub use retry::RetryPolicy;
pub use reqwest::StatusCode;

use async_trait::async_trait;

/// Issue and note operations against a GitLab project.
#[async_trait]
pub trait IssueApi: Send + Sync {
    /// `GET /projects/{project}/issues?{query}`
    async fn list_issues(&self, project: &ProjectRef, query: &IssueQuery) -> ApiResult<Vec<Issue>>;

    /// `GET /projects/{project}/issues/{iid}`
    async fn get_issue(&self, project: &ProjectRef, iid: u64) -> ApiResult<Issue>;

    /// `POST /projects/{project}/issues`
    async fn create_issue(&self, project: &ProjectRef, issue: &NewIssue) -> ApiResult<Issue>;

    /// `PUT /projects/{project}/issues/{iid}`
    async fn update_issue(
        &self,
        project: &ProjectRef,
        iid: u64,
        update: &IssueUpdate,
    ) -> ApiResult<Issue>;

    /// `POST /projects/{project}/issues/{iid}/notes`
    async fn create_note(&self, project: &ProjectRef, iid: u64, note: &NewNote) -> ApiResult<Note>;
}
