//! Configuration for the release tracker.
//!
//! Values come from explicit overrides (CLI flags) first, then from the
//! environment variables GitLab CI and semantic-release setups already use.

use gitlab_api::{GitLabClient, ProjectRef, RetryPolicy};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TrackerError};
use crate::marker::{FailurePolicy, MarkerSettings};
use crate::upsert::DEFAULT_CONFLICT_RETRIES;
use crate::version_map::{MalformedPolicy, VersionMapCodec};

/// Label identifying the tracking issue.
pub const DEFAULT_LABEL: &str = "submodule_released";
/// Title of a newly created tracking issue.
pub const DEFAULT_TITLE: &str = "Project release requested by submodule release";
/// Default retry limit for GitLab requests.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;
/// Default Maven descriptor path.
pub const DEFAULT_POM_PATH: &str = "pom.xml";

const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";
const DEFAULT_API_PREFIX: &str = "/api/v4";

/// Explicitly configured values; `None` falls back to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub gitlab_url: Option<String>,
    pub api_path_prefix: Option<String>,
    pub token: Option<String>,
    pub parent: Option<String>,
    pub pom_path: Option<PathBuf>,
    pub retry_limit: Option<u32>,
    pub label: Option<String>,
    pub title: Option<String>,
    pub malformed_policy: Option<MalformedPolicy>,
    pub failure_policy: Option<FailurePolicy>,
    pub conflict_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// GitLab web URL, e.g. `https://gitlab.com`.
    pub gitlab_url: String,
    /// GitLab REST API base, e.g. `https://gitlab.com/api/v4`.
    pub api_url: String,
    pub token: String,
    /// Parent project receiving the tracking issue; `None` disables marking.
    pub parent: Option<ProjectRef>,
    pub pom_path: PathBuf,
    pub retry_limit: u32,
    pub label: String,
    pub title: String,
    pub malformed_policy: MalformedPolicy,
    pub failure_policy: FailurePolicy,
    pub conflict_retries: u32,
    /// Bound on each GitLab request; unbounded when `None`.
    pub timeout: Option<Duration>,
}

impl TrackerConfig {
    /// Resolve from the process environment.
    ///
    /// # Errors
    ///
    /// See [`TrackerConfig::resolve`].
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::resolve(overrides, &env)
    }

    /// Resolve `overrides` against the variables in `env`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Config`] when no token is configured or an
    /// environment value cannot be parsed.
    pub fn resolve(overrides: ConfigOverrides, env: &HashMap<String, String>) -> Result<Self> {
        let var = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

        let user_url = overrides
            .gitlab_url
            .or_else(|| var("GL_URL"))
            .or_else(|| var("GITLAB_URL"));
        let prefix = overrides
            .api_path_prefix
            .or_else(|| var("GL_PREFIX"))
            .or_else(|| var("GITLAB_PREFIX"));
        let on_gitlab_ci = var("GITLAB_CI").is_some();

        let gitlab_url = user_url
            .clone()
            .or_else(|| {
                let project_url = var("CI_PROJECT_URL")?;
                let project_path = var("CI_PROJECT_PATH")?;
                on_gitlab_ci.then(|| {
                    project_url
                        .strip_suffix(&format!("/{project_path}"))
                        .unwrap_or(project_url.as_str())
                        .to_string()
                })
            })
            .unwrap_or_else(|| DEFAULT_GITLAB_URL.to_string());

        let api_url = match (&user_url, &prefix, var("CI_API_V4_URL")) {
            (Some(url), Some(prefix), _) => join_url(url, prefix),
            (_, _, Some(ci_api)) if on_gitlab_ci => ci_api,
            _ => join_url(&gitlab_url, prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX)),
        };

        let token = overrides
            .token
            .or_else(|| var("GL_TOKEN"))
            .or_else(|| var("GITLAB_TOKEN"))
            .ok_or_else(|| {
                TrackerError::Config("no GitLab token; set GL_TOKEN or GITLAB_TOKEN".to_string())
            })?;

        let parent = overrides
            .parent
            .or_else(|| var("CI_PARENT_ID_OR_PATH"))
            .map(ProjectRef::new);

        let pom_path = overrides
            .pom_path
            .or_else(|| var("CI_POM_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POM_PATH));

        Ok(Self {
            gitlab_url,
            api_url,
            token,
            parent,
            pom_path,
            retry_limit: resolve_parsed(
                overrides.retry_limit,
                var("RELEASE_TRACKER_RETRY_LIMIT"),
                DEFAULT_RETRY_LIMIT,
            )?,
            label: overrides
                .label
                .or_else(|| var("RELEASE_TRACKER_LABEL"))
                .unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            title: overrides
                .title
                .or_else(|| var("RELEASE_TRACKER_TITLE"))
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            malformed_policy: resolve_parsed(
                overrides.malformed_policy,
                var("RELEASE_TRACKER_ON_MALFORMED"),
                MalformedPolicy::default(),
            )?,
            failure_policy: resolve_parsed(
                overrides.failure_policy,
                var("RELEASE_TRACKER_FAILURE_POLICY"),
                FailurePolicy::default(),
            )?,
            conflict_retries: resolve_parsed(
                overrides.conflict_retries,
                var("RELEASE_TRACKER_CONFLICT_RETRIES"),
                DEFAULT_CONFLICT_RETRIES,
            )?,
            timeout: resolve_optional(
                overrides.timeout_secs,
                var("RELEASE_TRACKER_TIMEOUT_SECS"),
            )?
            .map(Duration::from_secs),
        })
    }

    /// Build a GitLab client honoring the configured retry limit and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    pub fn client(&self) -> Result<GitLabClient> {
        let mut builder = GitLabClient::builder(&self.api_url, &self.token)
            .retry(RetryPolicy::with_limit(self.retry_limit));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }

    /// Marker settings for the configured parent, if any.
    #[must_use]
    pub fn marker_settings(&self) -> Option<MarkerSettings> {
        let parent = self.parent.clone()?;
        Some(MarkerSettings {
            parent,
            label: self.label.clone(),
            title: self.title.clone(),
            codec: VersionMapCodec::new(self.malformed_policy),
            failure_policy: self.failure_policy,
            conflict_retries: self.conflict_retries,
        })
    }
}

fn resolve_parsed<T>(explicit: Option<T>, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = explicit {
        return Ok(value);
    }
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| TrackerError::Config(format!("invalid value '{raw}': {e}"))),
        None => Ok(default),
    }
}

fn resolve_optional<T>(explicit: Option<T>, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match (explicit, raw) {
        (Some(value), _) => Ok(Some(value)),
        (None, Some(raw)) => raw
            .parse()
            .map(Some)
            .map_err(|e| TrackerError::Config(format!("invalid value '{raw}': {e}"))),
        (None, None) => Ok(None),
    }
}

fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        base.trim_end_matches('/').to_string()
    } else {
        format!("{}/{path}", base.trim_end_matches('/'))
    }
}
