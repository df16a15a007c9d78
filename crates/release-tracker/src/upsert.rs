//! Create-or-update of the tracking issue's version map.
//!
//! GitLab has no conditional update for issues, so the read-modify-write is
//! guarded on both sides instead:
//!
//! 1. before writing, the issue is re-read and its `updated_at` compared with
//!    the value seen when the map was decoded;
//! 2. after writing, the issue is re-read to check that no writer holding an
//!    older body replaced ours (our entry reverted, or another entry dropped).
//!
//! Either case means another pipeline wrote in between, and the whole
//! locate/decode/merge/write cycle runs again from the fresh body. A writer
//! that lands between our verification read and the end of the run can still
//! overwrite us; it will in turn verify its own entry, not ours.

use gitlab_api::{Issue, IssueApi, IssueUpdate, NewIssue, ProjectRef};
use tracing::{debug, info, warn};

use crate::error::{Result, TrackerError};
use crate::locator::IssueLocator;
use crate::version_map::{VersionMap, VersionMapCodec};

/// Default number of extra cycles after a detected concurrent write.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Tracking issue the map was written to.
    pub iid: u64,
    /// Whether the issue was created by this call.
    pub created: bool,
    /// Map as written.
    pub map: VersionMap,
    /// Number of locate/write cycles it took.
    pub attempts: u32,
}

/// What one update cycle observed.
enum Cycle {
    Written(VersionMap),
    Conflict(&'static str),
}

/// Records `module: version` on the parent project's tracking issue.
pub struct AggregateUpsert<'a> {
    api: &'a dyn IssueApi,
    codec: VersionMapCodec,
    conflict_retries: u32,
}

impl<'a> AggregateUpsert<'a> {
    #[must_use]
    pub fn new(api: &'a dyn IssueApi, codec: VersionMapCodec) -> Self {
        Self {
            api,
            codec,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    #[must_use]
    pub fn with_conflict_retries(mut self, conflict_retries: u32) -> Self {
        self.conflict_retries = conflict_retries;
        self
    }

    /// Create the tracking issue with `{module: version}`, or set the entry on
    /// the existing one.
    ///
    /// Without contention exactly one write is made. Every call writes, even
    /// when the entry already holds `version`.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::MultipleTrackingIssuesFound`] before any write
    /// - [`TrackerError::MalformedDescription`] under a fail-fast codec
    /// - [`TrackerError::ConcurrentModification`] when every cycle conflicted
    /// - [`TrackerError::Api`] for request failures, unchanged
    pub async fn upsert(
        &self,
        project: &ProjectRef,
        label: &str,
        title: &str,
        module: &str,
        version: &str,
    ) -> Result<UpsertOutcome> {
        let locator = IssueLocator::new(self.api);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let Some(issue) = locator.locate(project, label).await? else {
                return self
                    .create(project, label, title, module, version, attempts)
                    .await;
            };

            match self.update(project, &issue, module, version).await? {
                Cycle::Written(map) => {
                    info!(
                        project = %project,
                        iid = issue.iid,
                        module = %module,
                        version = %version,
                        attempts,
                        "Updated tracking issue"
                    );
                    return Ok(UpsertOutcome {
                        iid: issue.iid,
                        created: false,
                        map,
                        attempts,
                    });
                }
                Cycle::Conflict(reason) => {
                    if attempts > self.conflict_retries {
                        return Err(TrackerError::ConcurrentModification {
                            iid: issue.iid,
                            attempts,
                        });
                    }
                    warn!(
                        project = %project,
                        iid = issue.iid,
                        reason,
                        attempt = attempts,
                        "Tracking issue changed concurrently, merging again"
                    );
                }
            }
        }
    }

    async fn create(
        &self,
        project: &ProjectRef,
        label: &str,
        title: &str,
        module: &str,
        version: &str,
        attempts: u32,
    ) -> Result<UpsertOutcome> {
        let mut map = self.codec.decode("")?;
        map.set(module, version);

        let issue = self
            .api
            .create_issue(
                project,
                &NewIssue {
                    title: title.to_string(),
                    description: self.codec.encode(&map)?,
                    labels: vec![label.to_string()],
                },
            )
            .await?;

        info!(
            project = %project,
            iid = issue.iid,
            module = %module,
            version = %version,
            "Created tracking issue"
        );

        Ok(UpsertOutcome {
            iid: issue.iid,
            created: true,
            map,
            attempts,
        })
    }

    async fn update(
        &self,
        project: &ProjectRef,
        issue: &Issue,
        module: &str,
        version: &str,
    ) -> Result<Cycle> {
        let mut map = self.codec.decode(issue.body())?;
        let previous = map.set(module, version);
        debug!(
            iid = issue.iid,
            module = %module,
            previous = ?previous,
            version = %version,
            "Merged version into tracking map"
        );
        let description = self.codec.encode(&map)?;

        if issue.updated_at.is_some() {
            let current = self.api.get_issue(project, issue.iid).await?;
            if current.updated_at != issue.updated_at {
                return Ok(Cycle::Conflict("modified before write"));
            }
        }

        self.api
            .update_issue(project, issue.iid, &IssueUpdate { description })
            .await?;

        let written = self.api.get_issue(project, issue.iid).await?;
        let overwritten = match self.codec.decode(written.body()) {
            Ok(current) => {
                overwritten_by_stale_writer(&map, &current, module, previous.as_deref())
            }
            Err(_) => true,
        };
        if overwritten {
            return Ok(Cycle::Conflict("overwritten after write"));
        }

        Ok(Cycle::Written(map))
    }
}

/// Whether `current` shows our write of `module` was replaced by a body built
/// from an older read.
///
/// That is the case when `module` is back at the value we merged over, or when
/// an entry we wrote for another module is gone. A different, newer value for
/// `module` is a later release of the same module and wins.
fn overwritten_by_stale_writer(
    written: &VersionMap,
    current: &VersionMap,
    module: &str,
    previous: Option<&str>,
) -> bool {
    let ours = written.get(module);
    let now = current.get(module);
    if now != ours && now == previous {
        return true;
    }
    written
        .keys()
        .any(|key| key != module && current.get(key).is_none())
}
