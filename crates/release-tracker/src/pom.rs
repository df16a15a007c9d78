//! Module name resolution from a Maven `pom.xml`.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a `pom.xml` could not provide an artifact id.
#[derive(Debug, Error)]
pub enum PomError {
    #[error("failed to read pom: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse pom: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("pom has no <project><artifactId>")]
    MissingArtifactId,
}

/// Name the module is tracked under.
///
/// Uses the top-level `<artifactId>` of the pom at `pom_path`; when the file
/// is missing or unusable, falls back to the last segment of
/// `project_path` (`group/parent/core` gives `core`).
#[must_use]
pub fn module_name(pom_path: &Path, project_path: &str) -> String {
    match read_artifact_id(pom_path) {
        Ok(artifact_id) => artifact_id,
        Err(e) => {
            let fallback = project_path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            debug!(
                pom = %pom_path.display(),
                error = %e,
                module = %fallback,
                "Using project path for module name"
            );
            fallback
        }
    }
}

/// Read the top-level artifact id from the pom at `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or has no
/// top-level `<artifactId>`.
pub fn read_artifact_id(path: &Path) -> Result<String, PomError> {
    let xml = std::fs::read_to_string(path)?;
    artifact_id(&xml)
}

/// Extract `<project><artifactId>` from pom XML, ignoring the `<parent>` and
/// dependency artifact ids.
///
/// # Errors
///
/// Returns an error for malformed XML or a missing artifact id.
pub fn artifact_id(xml: &str) -> Result<String, PomError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => path.push(e.local_name().as_ref().to_vec()),
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text)
                if path.len() == 2 && path[0] == b"project" && path[1] == b"artifactId" =>
            {
                let value = text.unescape()?;
                let value = value.trim();
                if !value.is_empty() {
                    return Ok(value.to_string());
                }
            }
            Event::Eof => return Err(PomError::MissingArtifactId),
            _ => {}
        }
    }
}
