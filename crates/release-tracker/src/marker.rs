//! Marks a module release on the parent project.

use gitlab_api::{IssueApi, ProjectRef};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::announcer::ReleaseAnnouncer;
use crate::error::{Result, TrackerError};
use crate::events::{ReleaseEvent, ReleaseSelector};
use crate::upsert::{AggregateUpsert, UpsertOutcome, DEFAULT_CONFLICT_RETRIES};
use crate::version_map::VersionMapCodec;

/// Whether a failure to mark the parent fails the module's own release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Log the error and carry on.
    BestEffort,
}

impl FailurePolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::BestEffort => "best-effort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" | "fail" => Ok(Self::Propagate),
            "best-effort" | "besteffort" | "ignore" => Ok(Self::BestEffort),
            other => Err(TrackerError::Config(format!("unknown failure policy '{other}'"))),
        }
    }
}

/// What [`ParentMarker::mark`] did.
#[derive(Debug)]
pub enum MarkOutcome {
    /// No release event belonged to this module.
    NoRelease,
    /// The version map was written and the notes posted.
    Marked {
        module: String,
        version: String,
        upsert: UpsertOutcome,
    },
    /// Marking failed and the failure policy is best-effort.
    Failed(TrackerError),
}

/// Parent project settings for [`ParentMarker`].
#[derive(Debug, Clone)]
pub struct MarkerSettings {
    pub parent: ProjectRef,
    pub label: String,
    pub title: String,
    pub codec: VersionMapCodec,
    pub failure_policy: FailurePolicy,
    pub conflict_retries: u32,
}

impl MarkerSettings {
    #[must_use]
    pub fn new(parent: ProjectRef) -> Self {
        Self {
            parent,
            label: crate::config::DEFAULT_LABEL.to_string(),
            title: crate::config::DEFAULT_TITLE.to_string(),
            codec: VersionMapCodec::default(),
            failure_policy: FailurePolicy::default(),
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

/// Records this module's release on the parent tracking issue and posts its
/// notes there.
pub struct ParentMarker<'a> {
    api: &'a dyn IssueApi,
    settings: MarkerSettings,
}

impl<'a> ParentMarker<'a> {
    #[must_use]
    pub fn new(api: &'a dyn IssueApi, settings: MarkerSettings) -> Self {
        Self { api, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &MarkerSettings {
        &self.settings
    }

    /// Mark the first published release in `releases` that `selector`
    /// accepts. Releases without a name are ignored.
    ///
    /// The module name comes from the event when it carries one, otherwise
    /// from `module_name`. The version map is written before the notes are
    /// posted; a failed note never undoes the map update.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Propagate`], any upsert error, or
    /// [`TrackerError::Announce`] when only the note failed. Under
    /// [`FailurePolicy::BestEffort`] errors are returned as
    /// [`MarkOutcome::Failed`] instead.
    pub async fn mark(
        &self,
        releases: &[ReleaseEvent],
        selector: &dyn ReleaseSelector,
        module_name: &str,
    ) -> Result<MarkOutcome> {
        let Some(release) = releases
            .iter()
            .filter(|r| r.is_published())
            .find(|r| selector.selects(r))
        else {
            info!(parent = %self.settings.parent, "No releases to mark on parent");
            return Ok(MarkOutcome::NoRelease);
        };

        let module = release.module_name.as_deref().unwrap_or(module_name);
        info!(
            parent = %self.settings.parent,
            module = %module,
            version = %release.version,
            "Marking release on parent"
        );

        match self.mark_release(module, release).await {
            Ok(upsert) => Ok(MarkOutcome::Marked {
                module: module.to_string(),
                version: release.version.clone(),
                upsert,
            }),
            Err(e) => match self.settings.failure_policy {
                FailurePolicy::Propagate => Err(e),
                FailurePolicy::BestEffort => {
                    warn!(
                        parent = %self.settings.parent,
                        module = %module,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Failed to mark release on parent, continuing"
                    );
                    Ok(MarkOutcome::Failed(e))
                }
            },
        }
    }

    async fn mark_release(&self, module: &str, release: &ReleaseEvent) -> Result<UpsertOutcome> {
        let settings = &self.settings;

        let upsert = AggregateUpsert::new(self.api, settings.codec)
            .with_conflict_retries(settings.conflict_retries)
            .upsert(
                &settings.parent,
                &settings.label,
                &settings.title,
                module,
                &release.version,
            )
            .await?;

        ReleaseAnnouncer::new(self.api)
            .announce(&settings.parent, upsert.iid, module, &release.notes)
            .await
            .map_err(|source| TrackerError::Announce {
                iid: upsert.iid,
                source,
            })?;

        Ok(upsert)
    }
}
