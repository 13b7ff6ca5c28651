// error.rs: Error types for the workspace subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A path traversal attempt was detected (security violation).
    #[error("path traversal detected: '{path}' resolves outside {root}")]
    PathTraversal { path: String, root: PathBuf },

    /// The path could not be resolved at all (NUL bytes, bad root, ...).
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The requested file was not found.
    #[error("file not found: '{path}'")]
    FileNotFound { path: String },

    /// The file exists but is not valid UTF-8 text.
    #[error("'{path}' is not a text file (it might be binary): {source}")]
    NotText {
        path: String,
        source: std::string::FromUtf8Error,
    },

    /// A find/replace edit on a staged file found nothing to replace.
    #[error("string '{pattern}' not found in staged file '{path}'")]
    PatternNotFound { path: String, pattern: String },
}
