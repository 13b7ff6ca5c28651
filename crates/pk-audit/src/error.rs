// error.rs: Error types for the audit subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing or reading audit logs.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Creating a log directory or writing/reading a log file failed.
    #[error("audit log I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the machine-readable block of an entry.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A log file is missing a field or the field is not in the expected shape.
    #[error("malformed log field '{field}'")]
    MalformedLog { field: String },

    /// Failed to read a file for hashing.
    #[error("failed to hash file at {path}: {source}")]
    HashFileFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}
