//! `reqwest`-backed GitLab client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{Issue, IssueQuery, IssueUpdate, NewIssue, NewNote, Note};
use crate::project::ProjectRef;
use crate::retry::RetryPolicy;
use crate::IssueApi;

/// Header GitLab reads personal/project access tokens from.
const PRIVATE_TOKEN_HEADER: &str = "private-token";

/// GitLab REST client for issue and note endpoints.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: reqwest::Client,
    api_url: String,
    retry: RetryPolicy,
}

impl GitLabClient {
    /// Create a client for `api_url` (e.g. `https://gitlab.com/api/v4`).
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(api_url: &str, token: &str) -> ApiResult<Self> {
        Self::builder(api_url, token).build()
    }

    /// Start a builder for non-default retry or timeout settings.
    #[must_use]
    pub fn builder(api_url: &str, token: &str) -> GitLabClientBuilder {
        GitLabClientBuilder {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }

    /// Base API URL this client talks to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Retry policy applied to every request.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn issues_url(&self, project: &ProjectRef) -> String {
        format!("{}/issues", project.api_url(&self.api_url))
    }

    fn issue_url(&self, project: &ProjectRef, iid: u64) -> String {
        format!("{}/issues/{iid}", project.api_url(&self.api_url))
    }

    /// Send a JSON request, retrying transient failures of idempotent methods,
    /// and decode the answer.
    async fn send_json<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let text = self
            .send_with_retry(&method, || {
                let request = self.client.request(method.clone(), url);
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            })
            .await?;

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{method} {url}: {e}")))
    }

    async fn send_with_retry<F>(&self, method: &Method, build: F) -> ApiResult<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let limit = if RetryPolicy::is_retryable_method(method) {
            self.retry.limit
        } else {
            0
        };
        let mut retry = 0;
        loop {
            let result = build().send().await;

            let error = match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.text().await?);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let error = ApiError::Status { status, body };
                    if !RetryPolicy::is_retryable_status(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) if e.is_builder() => return Err(ApiError::Transport(e)),
                Err(e) => ApiError::Transport(e),
            };

            if retry >= limit {
                return Err(error);
            }
            retry += 1;
            let delay = self.retry.delay_for(retry);
            warn!(
                retry,
                limit,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Retrying GitLab request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl IssueApi for GitLabClient {
    async fn list_issues(&self, project: &ProjectRef, query: &IssueQuery) -> ApiResult<Vec<Issue>> {
        let url = format!("{}?{}", self.issues_url(project), query.to_query_string());
        debug!(url = %url, "Listing issues");
        self.send_json::<(), _>(Method::GET, &url, None).await
    }

    async fn get_issue(&self, project: &ProjectRef, iid: u64) -> ApiResult<Issue> {
        let url = self.issue_url(project, iid);
        debug!(url = %url, "Fetching issue");
        self.send_json::<(), _>(Method::GET, &url, None).await
    }

    async fn create_issue(&self, project: &ProjectRef, issue: &NewIssue) -> ApiResult<Issue> {
        let url = self.issues_url(project);
        debug!(url = %url, title = %issue.title, "Creating issue");
        self.send_json(Method::POST, &url, Some(issue)).await
    }

    async fn update_issue(
        &self,
        project: &ProjectRef,
        iid: u64,
        update: &IssueUpdate,
    ) -> ApiResult<Issue> {
        let url = self.issue_url(project, iid);
        debug!(url = %url, "Updating issue");
        self.send_json(Method::PUT, &url, Some(update)).await
    }

    async fn create_note(&self, project: &ProjectRef, iid: u64, note: &NewNote) -> ApiResult<Note> {
        let url = format!("{}/notes", self.issue_url(project, iid));
        debug!(url = %url, "Creating issue note");
        self.send_json(Method::POST, &url, Some(note)).await
    }
}

/// Builder for [`GitLabClient`].
#[derive(Debug, Clone)]
pub struct GitLabClientBuilder {
    api_url: String,
    token: String,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl GitLabClientBuilder {
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bound on a single HTTP request, retries excluded.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn build(self) -> ApiResult<GitLabClient> {
        let mut token = HeaderValue::from_str(&self.token)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid token: {e}")))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("release-tracker/1.0"));
        headers.insert(PRIVATE_TOKEN_HEADER, token);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        Ok(GitLabClient {
            client,
            api_url: self.api_url,
            retry: self.retry,
        })
    }
}
