// outcome.rs: Successful results of engine operations.
//
// Each outcome keeps the structured facts (paths, log records) for callers
// that want them, and renders the confirmation shown to the agent.

use pk_audit::{LogRecord, SubjectType};
use pk_workspace::StagedFile;

use crate::engine::EditMode;

/// What `edit` did with the caller's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Written to the live file.
    Applied { path: String, mode: EditMode },
    /// The live file looked locked; the full intended content was staged.
    Staged(StagedFile),
}

impl EditOutcome {
    pub fn describe(&self, label: &str) -> String {
        match self {
            EditOutcome::Applied { path, mode } => format!(
                "{} file '{}' successfully updated with mode '{}'.",
                label, path, mode
            ),
            EditOutcome::Staged(staged) => staged.describe(label),
        }
    }

    pub fn is_staged(&self) -> bool {
        matches!(self, EditOutcome::Staged(_))
    }
}

/// A file or folder created by `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub path: String,
    pub is_folder: bool,
}

impl Created {
    pub fn describe(&self, label: &str) -> String {
        let what = if self.is_folder { "folder" } else { "file" };
        format!("{} {} created at: {}", label, what, self.path)
    }
}

/// A deletion request written to the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedForDeletion {
    pub path: String,
    pub subject_type: SubjectType,
    pub log: LogRecord,
}

impl MarkedForDeletion {
    pub fn describe(&self, label: &str) -> String {
        format!(
            "{} {} '{}' marked for deletion.\nDeletion log: {}\nPlease review and manually delete when ready.",
            label, self.subject_type, self.path, self.log.location
        )
    }
}

/// A rename request written to the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRename {
    pub old_path: String,
    pub new_name: String,
    pub subject_type: SubjectType,
    /// The destination already existed when the request was made.
    pub conflict: bool,
    pub log: LogRecord,
}

impl StagedRename {
    pub fn describe(&self, label: &str) -> String {
        let warning = if self.conflict {
            "WARNING: Destination already exists!\n"
        } else {
            ""
        };
        format!(
            "{} {} '{}' staged for rename to '{}'.\nRename log: {}\n{}Please review and manually perform the rename when ready.",
            label, self.subject_type, self.old_path, self.new_name, self.log.location, warning
        )
    }
}

/// A move that ran, with its audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMove {
    pub source: String,
    pub destination: String,
    pub subject_type: SubjectType,
    pub log: LogRecord,
}

impl CompletedMove {
    pub fn describe(&self, label: &str) -> String {
        format!(
            "SUCCESS: {} {} successfully moved:\n   From: {}\n   To: {}\n   Audit log: {}",
            label, self.subject_type, self.source, self.destination, self.log.location
        )
    }
}
