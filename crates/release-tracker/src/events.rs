//! Release events handed over by the release pipeline.

use serde::{Deserialize, Serialize};

/// One release produced by the pipeline, as reported by the publishing plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEvent {
    /// Plugin that published the release.
    #[serde(default)]
    pub plugin_name: String,
    /// Module the release belongs to, when the pipeline knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    pub version: String,
    /// Rendered release notes (markdown).
    #[serde(default)]
    pub notes: String,
    /// Display name of the release, if the plugin set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ReleaseEvent {
    /// Whether the plugin actually published a release; plugins report
    /// skipped or dry-run releases without a name.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Decides which release events belong to the module being tracked.
pub trait ReleaseSelector: Send + Sync {
    fn selects(&self, event: &ReleaseEvent) -> bool;
}

impl<F> ReleaseSelector for F
where
    F: Fn(&ReleaseEvent) -> bool + Send + Sync,
{
    fn selects(&self, event: &ReleaseEvent) -> bool {
        self(event)
    }
}

/// Selects releases published by one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginNameSelector {
    plugin_name: String,
}

impl PluginNameSelector {
    #[must_use]
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
        }
    }
}

impl ReleaseSelector for PluginNameSelector {
    fn selects(&self, event: &ReleaseEvent) -> bool {
        event.plugin_name == self.plugin_name
    }
}

/// Selects every release.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyRelease;

impl ReleaseSelector for AnyRelease {
    fn selects(&self, _event: &ReleaseEvent) -> bool {
        true
    }
}
