// error.rs: Error taxonomy for engine operations.
//
// Messages are shown to the calling agent verbatim after an "Error: "
// marker, so they name the offending path in project-relative form.

use std::path::PathBuf;
use thiserror::Error;

use pk_audit::AuditError;
use pk_workspace::WorkspaceError;

/// Errors returned by [`MutationEngine`](crate::MutationEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The path failed the containment check or cannot be used here.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The target does not exist.
    #[error("Path not found: '{path}'")]
    NotFound { path: String },

    /// Expected a file and got a directory, or the other way round.
    #[error("'{path}' is not a {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
    },

    /// The destination of a move already exists. Nothing was changed.
    #[error("Destination '{path}' already exists; nothing was moved")]
    Conflict { path: String },

    /// The file is not valid UTF-8.
    #[error("'{path}' is not a text file (it might be binary)")]
    NotText { path: String },

    /// `edit` was called with an unknown mode.
    #[error("Invalid mode '{mode}'. Use 'replace' or 'append'.")]
    InvalidMode { mode: String },

    /// A find/replace on a staged file matched nothing.
    #[error("String '{pattern}' not found in staged file '{path}'")]
    NoMatch { path: String, pattern: String },

    /// An OS-level failure that is not reported as one of the above.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing or reading an audit log failed.
    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),
}

impl From<WorkspaceError> for EngineError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::PathTraversal { path, .. } => EngineError::InvalidPath {
                path,
                reason: "access denied or outside the project root".to_string(),
            },
            WorkspaceError::InvalidPath { path, reason } => {
                EngineError::InvalidPath { path, reason }
            }
            WorkspaceError::FileNotFound { path } => EngineError::NotFound { path },
            WorkspaceError::NotText { path, .. } => EngineError::NotText { path },
            WorkspaceError::PatternNotFound { path, pattern } => {
                EngineError::NoMatch { path, pattern }
            }
            WorkspaceError::IoError { path, source } => EngineError::Io { path, source },
        }
    }
}
