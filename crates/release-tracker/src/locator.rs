//! Finds the open tracking issue on the parent project.

use gitlab_api::{Issue, IssueApi, IssueQuery, ProjectRef};
use tracing::{debug, error};

use crate::error::{Result, TrackerError};

/// Looks up the single open issue carrying the tracking label.
pub struct IssueLocator<'a> {
    api: &'a dyn IssueApi,
}

impl<'a> IssueLocator<'a> {
    #[must_use]
    pub fn new(api: &'a dyn IssueApi) -> Self {
        Self { api }
    }

    /// Return the open tracking issue, or `None` when there is none yet.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MultipleTrackingIssuesFound`] when more than one
    /// open issue carries `label`, and [`TrackerError::Api`] when the query
    /// fails.
    pub async fn locate(&self, project: &ProjectRef, label: &str) -> Result<Option<Issue>> {
        let query = IssueQuery::open_with_label(label);
        let mut issues = self.api.list_issues(project, &query).await?;

        debug!(
            project = %project,
            label = %label,
            count = issues.len(),
            "Queried open tracking issues"
        );

        match issues.len() {
            0 => Ok(None),
            1 => Ok(issues.pop()),
            count => {
                error!(
                    project = %project,
                    count,
                    iids = ?issues.iter().map(|i| i.iid).collect::<Vec<_>>(),
                    "Multiple open tracking issues found"
                );
                Err(TrackerError::MultipleTrackingIssuesFound {
                    count,
                    project: project.clone(),
                })
            }
        }
    }
}
