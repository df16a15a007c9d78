//! GitLab issue and note payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue state as reported by GitLab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Opened,
    Closed,
}

impl IssueState {
    /// Value used by the `state` query parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
        }
    }
}

/// A project issue.
///
/// GitLab returns far more fields than this; only the ones the tracker reads
/// are kept. Everything except `iid` is optional on the wire so partial
/// payloads (older instances, test doubles) still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub id: u64,
    /// Project-scoped issue number used in URLs.
    pub iid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub state: IssueState,
    /// Last-modified marker used for conflict detection.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Issue body, treating a missing description as empty.
    #[must_use]
    pub fn body(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub body: String,
}

/// Body of `POST /projects/{id}/issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
}

/// Body of `PUT /projects/{id}/issues/{iid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    pub description: String,
}

/// Body of `POST /projects/{id}/issues/{iid}/notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNote {
    pub body: String,
}

/// Filter for listing project issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub labels: String,
    pub state: IssueState,
}

impl IssueQuery {
    /// Open issues carrying `label`, newest first.
    #[must_use]
    pub fn open_with_label(label: impl Into<String>) -> Self {
        Self {
            labels: label.into(),
            state: IssueState::Opened,
        }
    }

    /// Query pairs in the order GitLab documents them.
    #[must_use]
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("labels", self.labels.as_str()),
            ("state", self.state.as_str()),
            ("order_by", "created_at"),
            ("sort", "desc"),
        ]
    }

    /// Render as a query string without the leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.pairs()
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
