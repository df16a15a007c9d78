//! In-memory `IssueApi` used by unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use gitlab_api::{
    ApiError, ApiResult, Issue, IssueApi, IssueQuery, IssueState, IssueUpdate, NewIssue, NewNote,
    Note, ProjectRef, StatusCode,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Request counts per endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub list: usize,
    pub get: usize,
    pub create: usize,
    pub update: usize,
    pub note: usize,
}

impl Calls {
    pub fn writes(&self) -> usize {
        self.create + self.update
    }
}

#[derive(Default)]
struct State {
    issues: Vec<Issue>,
    notes: Vec<(u64, String)>,
    calls: Calls,
    clock: i64,
    fail_writes: bool,
    fail_notes: bool,
    // Descriptions written by a simulated concurrent pipeline, one per get_issue call.
    interference: VecDeque<Option<String>>,
}

impl State {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.timestamp_opt(1_700_000_000 + self.clock, 0)
            .single()
            .unwrap_or_default()
    }

    fn issue_mut(&mut self, iid: u64) -> ApiResult<&mut Issue> {
        self.issues
            .iter_mut()
            .find(|i| i.iid == iid)
            .ok_or_else(|| server_error(StatusCode::NOT_FOUND))
    }
}

fn server_error(status: StatusCode) -> ApiError {
    ApiError::Status {
        status,
        body: String::new(),
    }
}

pub struct FakeIssueApi {
    state: Mutex<State>,
}

impl FakeIssueApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Add an open issue with `label` and return its iid.
    pub fn seed_issue(&self, label: &str, description: &str) -> u64 {
        let mut state = self.state();
        let iid = state.issues.len() as u64 + 1;
        let updated_at = state.tick();
        state.issues.push(Issue {
            id: 1000 + iid,
            iid,
            title: "seeded".to_string(),
            description: Some(description.to_string()),
            labels: vec![label.to_string()],
            state: IssueState::Opened,
            updated_at: Some(updated_at),
        });
        iid
    }

    pub fn close_issue(&self, iid: u64) {
        if let Ok(issue) = self.state().issue_mut(iid) {
            issue.state = IssueState::Closed;
        }
    }

    /// Queue descriptions a concurrent writer stores just before each
    /// upcoming `get_issue`; `None` leaves that read undisturbed.
    pub fn interfere(&self, writes: impl IntoIterator<Item = Option<&'static str>>) {
        self.state()
            .interference
            .extend(writes.into_iter().map(|w| w.map(str::to_string)));
    }

    pub fn fail_writes(&self) {
        self.state().fail_writes = true;
    }

    pub fn fail_notes(&self) {
        self.state().fail_notes = true;
    }

    pub fn calls(&self) -> Calls {
        self.state().calls
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.state().issues.clone()
    }

    pub fn description(&self, iid: u64) -> String {
        self.state()
            .issues
            .iter()
            .find(|i| i.iid == iid)
            .map(|i| i.body().to_string())
            .unwrap_or_default()
    }

    pub fn notes(&self) -> Vec<(u64, String)> {
        self.state().notes.clone()
    }
}

#[async_trait]
impl IssueApi for FakeIssueApi {
    async fn list_issues(&self, _project: &ProjectRef, query: &IssueQuery) -> ApiResult<Vec<Issue>> {
        let mut state = self.state();
        state.calls.list += 1;
        let mut found: Vec<Issue> = state
            .issues
            .iter()
            .filter(|i| i.state == query.state && i.labels.contains(&query.labels))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.iid.cmp(&a.iid));
        Ok(found)
    }

    async fn get_issue(&self, _project: &ProjectRef, iid: u64) -> ApiResult<Issue> {
        let mut state = self.state();
        state.calls.get += 1;
        if let Some(Some(description)) = state.interference.pop_front() {
            let updated_at = state.tick();
            let issue = state.issue_mut(iid)?;
            issue.description = Some(description);
            issue.updated_at = Some(updated_at);
        }
        state.issue_mut(iid).map(|i| i.clone())
    }

    async fn create_issue(&self, _project: &ProjectRef, new: &NewIssue) -> ApiResult<Issue> {
        let mut state = self.state();
        state.calls.create += 1;
        if state.fail_writes {
            return Err(server_error(StatusCode::INTERNAL_SERVER_ERROR));
        }
        let iid = state.issues.len() as u64 + 1;
        let updated_at = state.tick();
        let issue = Issue {
            id: 1000 + iid,
            iid,
            title: new.title.clone(),
            description: Some(new.description.clone()),
            labels: new.labels.clone(),
            state: IssueState::Opened,
            updated_at: Some(updated_at),
        };
        state.issues.push(issue.clone());
        Ok(issue)
    }

    async fn update_issue(
        &self,
        _project: &ProjectRef,
        iid: u64,
        update: &IssueUpdate,
    ) -> ApiResult<Issue> {
        let mut state = self.state();
        state.calls.update += 1;
        if state.fail_writes {
            return Err(server_error(StatusCode::INTERNAL_SERVER_ERROR));
        }
        let updated_at = state.tick();
        let issue = state.issue_mut(iid)?;
        issue.description = Some(update.description.clone());
        issue.updated_at = Some(updated_at);
        Ok(issue.clone())
    }

    async fn create_note(&self, _project: &ProjectRef, iid: u64, note: &NewNote) -> ApiResult<Note> {
        let mut state = self.state();
        state.calls.note += 1;
        if state.fail_notes {
            return Err(server_error(StatusCode::INTERNAL_SERVER_ERROR));
        }
        state.issue_mut(iid)?;
        state.notes.push((iid, note.body.clone()));
        Ok(Note {
            id: state.notes.len() as u64,
            body: note.body.clone(),
        })
    }
}
