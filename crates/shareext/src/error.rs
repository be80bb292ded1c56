//! Error types for share extension hook operations.
//!
//! This module defines the [`enum@Error`] enum covering every fatal condition
//! the add/remove/copy hooks can hit: project discovery, manifest parsing,
//! project graph decoding and plain I/O.
//!
//! Removing a group that does not exist is deliberately absent from this
//! list: the removal hook treats it as a successful no-op.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use std::path::PathBuf;
use thiserror::Error;

/// Error type for share extension hook operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// Match on variants to handle specific failure cases.
///
/// # Examples
///
/// ```no_run
/// use shareext::{hooks, Error, HookContext};
///
/// match hooks::add_target(HookContext::new(".")) {
///     Ok(report) => println!("Target {} ready", report.target),
///     Err(Error::ProjectNotFound(msg)) => eprintln!("No Xcode project: {msg}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No `.xcodeproj` folder could be located in the platform folder.
    #[error("Could not find \".xcodeproj\" folder in {0}")]
    ProjectNotFound(String),

    /// More than one `.xcodeproj` folder exists, so the target project is ambiguous.
    #[error("Found {} \".xcodeproj\" folders, expected exactly one: {}", .0.len(), display_paths(.0))]
    AmbiguousProject(Vec<PathBuf>),

    /// The extension source folder is missing.
    #[error("Missing extension project folder in {}", .0.display())]
    MissingExtensionFiles(PathBuf),

    /// Application metadata (`<App>-Info.plist`, `config.xml`) could not be read.
    #[error("Missing application metadata: {0}")]
    MissingMetadata(String),

    /// A key-value manifest exists but is missing or malformed.
    #[error("Could not parse manifest {}: {message}", path.display())]
    ManifestParse {
        /// Manifest that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// The `project.pbxproj` text could not be decoded.
    #[error("Could not parse project file at line {line}: {message}")]
    ProjectParse {
        /// 1-based line of the offending token.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// The decoded project graph violates a structural invariant.
    #[error("Invalid project graph: {0}")]
    Graph(String),

    /// Invalid hook configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Property list decoding or encoding failed.
    #[error("Plist error: {0}")]
    Plist(#[from] plist::Error),
}

impl Error {
    /// True for the not-found family: no project, ambiguous project, missing extension folder.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ProjectNotFound(_) | Error::AmbiguousProject(_) | Error::MissingExtensionFiles(_)
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
