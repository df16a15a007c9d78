//! Project references.

use std::fmt;

/// A GitLab project identified by numeric id or by namespace path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef {
    id_or_path: String,
}

impl ProjectRef {
    #[must_use]
    pub fn new(id_or_path: impl Into<String>) -> Self {
        Self {
            id_or_path: id_or_path.into(),
        }
    }

    /// The raw id or path as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id_or_path
    }

    /// Path segment form (`group/project` becomes `group%2Fproject`).
    #[must_use]
    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.id_or_path).into_owned()
    }

    /// Project API URL under `api_base`, e.g. `https://gitlab.com/api/v4/projects/42`.
    #[must_use]
    pub fn api_url(&self, api_base: &str) -> String {
        format!("{}/projects/{}", api_base.trim_end_matches('/'), self.encoded())
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id_or_path)
    }
}

impl From<&str> for ProjectRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProjectRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
