//! Release tracking on a GitLab parent project.
//!
//! Projects built from many independently versioned submodules often need a
//! single place that says which module versions are ready to ship together.
//! This crate keeps that place: one open issue on the parent project whose
//! description is a `module: version` map, plus one comment per release with
//! the module's release notes.
//!
//! # Usage
//!
//! ```no_run
//! use gitlab_api::{GitLabClient, ProjectRef};
//! use release_tracker::{MarkerSettings, ParentMarker, PluginNameSelector, ReleaseEvent};
//!
//! # async fn run(releases: Vec<ReleaseEvent>) -> release_tracker::Result<()> {
//! let client = GitLabClient::new("https://gitlab.com/api/v4", "glpat-...")?;
//! let marker = ParentMarker::new(&client, MarkerSettings::new(ProjectRef::new("group/parent")));
//!
//! marker
//!     .mark(&releases, &PluginNameSelector::new("@semantic-release/gitlab"), "core")
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`VersionMapCodec`] reads and writes the issue description
//! - [`IssueLocator`] finds the tracking issue and refuses to pick between duplicates
//! - [`AggregateUpsert`] creates or updates the issue, re-merging on concurrent writes
//! - [`ReleaseAnnouncer`] appends the release notes as a comment
//! - [`ParentMarker`] runs the above for the release that belongs to this module
//!
//! # Configuration
//!
//! [`TrackerConfig`] resolves settings from CLI overrides and the environment:
//!
//! - `GL_TOKEN` / `GITLAB_TOKEN`: API token (required)
//! - `GL_URL` / `GITLAB_URL`, `GL_PREFIX` / `GITLAB_PREFIX`: GitLab location
//! - `CI_PARENT_ID_OR_PATH`: parent project; marking is skipped when unset
//! - `CI_POM_PATH`: pom used to name the module

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod announcer;
pub mod config;
pub mod error;
pub mod events;
pub mod locator;
pub mod marker;
pub mod pom;
pub mod upsert;
pub mod version_map;

#[cfg(test)]
mod testing;

pub use announcer::ReleaseAnnouncer;
pub use config::{ConfigOverrides, TrackerConfig};
pub use error::{Result, TrackerError};
pub use events::{AnyRelease, PluginNameSelector, ReleaseEvent, ReleaseSelector};
pub use locator::IssueLocator;
pub use marker::{FailurePolicy, MarkOutcome, MarkerSettings, ParentMarker};
pub use upsert::{AggregateUpsert, UpsertOutcome};
pub use version_map::{MalformedPolicy, VersionMap, VersionMapCodec};
