//! Module/version map stored in the tracking issue description.
//!
//! The description is a YAML mapping with one `module: version` line per
//! entry. Entry order is part of the format: updating a module keeps its
//! line where it is and a new module is appended, so each release changes
//! exactly one line of the issue body.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{Result, TrackerError};

/// Ordered mapping from module name to released version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMap {
    entries: IndexMap<String, String>,
}

impl VersionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Version recorded for `module`.
    #[must_use]
    pub fn get(&self, module: &str) -> Option<&str> {
        self.entries.get(module).map(String::as_str)
    }

    /// Record `version` for `module`.
    ///
    /// An existing module keeps its position; a new one goes last. Returns the
    /// previously recorded version.
    pub fn set(&mut self, module: impl Into<String>, version: impl Into<String>) -> Option<String> {
        self.entries.insert(module.into(), version.into())
    }

    /// Module names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(module, version)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VersionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (module, version) in iter {
            map.set(module, version);
        }
        map
    }
}

/// What to do with a description that is not a module/version mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Drop the unreadable content and start from an empty map.
    #[default]
    DiscardAndReset,
    /// Refuse to touch the issue.
    FailFast,
}

impl MalformedPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DiscardAndReset => "discard-and-reset",
            Self::FailFast => "fail-fast",
        }
    }
}

impl fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MalformedPolicy {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard-and-reset" | "discard" | "reset" => Ok(Self::DiscardAndReset),
            "fail-fast" | "fail" => Ok(Self::FailFast),
            other => Err(TrackerError::Config(format!(
                "unknown malformed-description policy '{other}'"
            ))),
        }
    }
}

/// Reads and writes [`VersionMap`]s as issue descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionMapCodec {
    on_malformed: MalformedPolicy,
}

impl VersionMapCodec {
    #[must_use]
    pub const fn new(on_malformed: MalformedPolicy) -> Self {
        Self { on_malformed }
    }

    #[must_use]
    pub const fn policy(&self) -> MalformedPolicy {
        self.on_malformed
    }

    /// Parse an issue description.
    ///
    /// Empty text is an empty map. Text that is not a flat mapping of scalars
    /// is handled per the configured [`MalformedPolicy`]; with
    /// `DiscardAndReset` its content is lost on the next write.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MalformedDescription`] under
    /// [`MalformedPolicy::FailFast`].
    pub fn decode(&self, body: &str) -> Result<VersionMap> {
        match parse(body) {
            Ok(map) => Ok(map),
            Err(reason) => match self.on_malformed {
                MalformedPolicy::DiscardAndReset => {
                    warn!(
                        reason = %reason,
                        discarded_bytes = body.len(),
                        "Discarding malformed tracking issue description"
                    );
                    Ok(VersionMap::new())
                }
                MalformedPolicy::FailFast => Err(TrackerError::MalformedDescription(reason)),
            },
        }
    }

    /// Render a map as an issue description, one `module: version` line each.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Encode`] if YAML serialization fails.
    pub fn encode(&self, map: &VersionMap) -> Result<String> {
        if map.is_empty() {
            return Ok(String::new());
        }
        let mapping: Mapping = map
            .iter()
            .map(|(k, v)| (Value::String(k.to_string()), Value::String(v.to_string())))
            .collect();
        Ok(serde_yaml::to_string(&mapping)?)
    }
}

fn parse(body: &str) -> std::result::Result<VersionMap, String> {
    if body.trim().is_empty() {
        return Ok(VersionMap::new());
    }

    let mapping = match serde_yaml::from_str::<Value>(body).map_err(|e| e.to_string())? {
        Value::Null => return Ok(VersionMap::new()),
        Value::Mapping(mapping) => mapping,
        other => return Err(format!("expected a mapping, found {}", kind(&other))),
    };

    let mut map = VersionMap::new();
    for (key, value) in &mapping {
        let module = scalar(key).ok_or_else(|| format!("unsupported key of type {}", kind(key)))?;
        let version = scalar(value)
            .ok_or_else(|| format!("value for '{module}' is a {}, not a version", kind(value)))?;
        map.set(module, version);
    }
    Ok(map)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
