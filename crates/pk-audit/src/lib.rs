//! # pk-audit
//!
//! Durable, human-readable records of destructive operations.
//!
//! Deletions and renames are never executed by Project Keeper. Instead each
//! request produces one markdown document under
//! `<base>/logs/<subdir>/<kind>/` holding a JSON block for tooling and a
//! checklist of shell commands for the human who will carry it out. Moves
//! do execute, and are recorded the same way afterwards.
//!
//! These files are the only record of pending intent; nothing else tracks
//! "pending" operations, and nothing here ever deletes them.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use pk_audit::{AuditLogWriter, DeletionEntry, SubjectType};
//! use pk_workspace::SizeInfo;
//!
//! let writer = AuditLogWriter::new("/srv/keeper", "web");
//! let entry = DeletionEntry::new(
//!     "old/report.txt",
//!     "/srv/web/old/report.txt",
//!     SubjectType::File,
//!     SizeInfo::File { size_bytes: 512 },
//! );
//! let record = writer.write(&entry).unwrap();
//! println!("review {}", record.location);
//! ```

pub mod entry;
pub mod error;
pub mod hasher;
pub mod summary;
pub mod writer;

pub use entry::{DeletionEntry, EntryKind, MoveEntry, RenameEntry, RenameTarget, SubjectType};
pub use error::AuditError;
pub use summary::{scan, DeletionSummary, FromLog, LogFile, MoveSummary, RenameSummary};
pub use writer::{format_size_info, sanitize, AuditLogWriter, LogEntry, LogRecord};
