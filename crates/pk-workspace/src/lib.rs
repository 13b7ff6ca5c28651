//! # pk-workspace
//!
//! Filesystem primitives for Project Keeper's mutation layer.
//!
//! Everything an agent touches goes through a [`PathGuard`] first. Writes
//! consult a [`LockProbe`] and fall back to the [`StagingStore`] when the
//! live file cannot be written, so the caller's content is never lost.
//!
//! ## Key components
//!
//! - [`PathGuard`]: resolves caller-supplied relative paths and rejects
//!   anything that escapes the project root.
//! - [`LockProbe`]: best-effort "is this file open elsewhere?" check.
//!   [`AppendProbe`] is the real implementation; tests inject their own.
//! - [`StagingStore`]: shadow tree under `<base>/.staging/<subdir>/` that
//!   holds edits which could not be applied directly.
//! - [`SizeInfo`]: byte/file counts attached to audit records.
//! - [`tree`]: recursive directory listing with build-artifact skip rules.

pub mod error;
pub mod guard;
pub mod probe;
pub mod size;
pub mod staging;
pub mod tree;

pub use error::WorkspaceError;
pub use guard::{PathGuard, ValidatedPath};
pub use probe::{is_lock_error, AppendProbe, LockProbe};
pub use size::SizeInfo;
pub use staging::{StageReason, StagedFile, StagingStore};
pub use tree::{DirectoryTree, SkipRules};
