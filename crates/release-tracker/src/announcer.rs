//! Release notes posted as comments on the tracking issue.

use gitlab_api::{ApiResult, IssueApi, NewNote, Note, ProjectRef};
use tracing::info;

/// Heading prefix semantic-release puts in front of the version.
const NOTES_HEADING: &str = "## ";

/// Appends one release-note comment per processed release.
///
/// Comments are never edited or deduplicated: re-running a pipeline after a
/// partial failure posts the notes again.
pub struct ReleaseAnnouncer<'a> {
    api: &'a dyn IssueApi,
}

impl<'a> ReleaseAnnouncer<'a> {
    #[must_use]
    pub fn new(api: &'a dyn IssueApi) -> Self {
        Self { api }
    }

    /// Post `notes` for `module` on issue `iid`.
    ///
    /// # Errors
    ///
    /// Returns the API error if the comment cannot be created.
    pub async fn announce(
        &self,
        project: &ProjectRef,
        iid: u64,
        module: &str,
        notes: &str,
    ) -> ApiResult<Note> {
        let body = note_body(module, notes);
        let note = self.api.create_note(project, iid, &NewNote { body }).await?;

        info!(
            project = %project,
            iid,
            note_id = note.id,
            module = %module,
            "Posted release note on tracking issue"
        );

        Ok(note)
    }
}

/// Put the module name into the notes heading.
///
/// `"## 1.0.0 (2024-05-01)"` becomes `"## core 1.0.0 (2024-05-01)"`; notes
/// without a leading `## ` heading get one.
#[must_use]
pub fn note_body(module: &str, notes: &str) -> String {
    match notes.strip_prefix(NOTES_HEADING) {
        Some(rest) => format!("{NOTES_HEADING}{module} {rest}"),
        None if notes.trim().is_empty() => format!("{NOTES_HEADING}{module}"),
        None => format!("{NOTES_HEADING}{module}\n\n{notes}"),
    }
}
