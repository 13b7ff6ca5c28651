// entry.rs: Audit entry data model.
//
// One struct per entry kind. Each is serialized as the JSON "Details" block
// of its markdown log; field names are part of the on-disk format.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use pk_workspace::SizeInfo;

/// The three kinds of audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deletion,
    Rename,
    Move,
}

impl EntryKind {
    /// Subdirectory of `logs/<subdir>/` holding this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            EntryKind::Deletion => "deletion",
            EntryKind::Rename => "rename",
            EntryKind::Move => "move_completed",
        }
    }

    /// File name prefix, e.g. `deletion_2026-10-16_...`.
    pub fn file_prefix(self) -> &'static str {
        match self {
            EntryKind::Deletion => "deletion",
            EntryKind::Rename => "rename",
            EntryKind::Move => "move",
        }
    }
}

/// Whether the subject of an operation is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    File,
    Directory,
}

impl SubjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectType::File => "file",
            SubjectType::Directory => "directory",
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to delete a path, awaiting a human.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionEntry {
    pub timestamp: DateTime<Local>,
    /// Path relative to the project root.
    pub path: String,
    pub full_path: PathBuf,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub size: SizeInfo,
    /// Fingerprint of a file's content when it was marked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_sha256: Option<String>,
    /// Always false when written; flipped only by hand.
    pub confirmed: bool,
}

impl DeletionEntry {
    pub fn new(
        path: impl Into<String>,
        full_path: impl Into<PathBuf>,
        subject_type: SubjectType,
        size: SizeInfo,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            path: path.into(),
            full_path: full_path.into(),
            subject_type,
            size,
            content_sha256: None,
            confirmed: false,
        }
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_sha256 = Some(hash.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A request to rename a path in place, awaiting a human.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameEntry {
    pub timestamp: DateTime<Local>,
    pub old_path: String,
    pub old_full_path: PathBuf,
    pub new_path: String,
    pub new_full_path: PathBuf,
    pub new_name: String,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub size: SizeInfo,
    pub dest_exists: bool,
    pub confirmed: bool,
    /// Same as `dest_exists`; the rename would overwrite something.
    pub conflict: bool,
}

/// Source and destination of a rename, before it is checked for conflicts.
#[derive(Debug, Clone)]
pub struct RenameTarget {
    pub old_path: String,
    pub old_full_path: PathBuf,
    pub new_path: String,
    pub new_full_path: PathBuf,
    pub new_name: String,
}

impl RenameEntry {
    /// `dest_exists` is sampled by the caller at request time.
    pub fn new(
        target: RenameTarget,
        subject_type: SubjectType,
        size: SizeInfo,
        dest_exists: bool,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            old_path: target.old_path,
            old_full_path: target.old_full_path,
            new_path: target.new_path,
            new_full_path: target.new_full_path,
            new_name: target.new_name,
            subject_type,
            size,
            dest_exists,
            confirmed: false,
            conflict: dest_exists,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A move that has already been carried out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveEntry {
    /// Taken just before the move ran.
    pub timestamp: DateTime<Local>,
    pub source_path: String,
    pub dest_path: String,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub size: SizeInfo,
    pub status: String,
    pub operation: String,
}

impl MoveEntry {
    pub fn completed(
        timestamp: DateTime<Local>,
        source_path: impl Into<String>,
        dest_path: impl Into<String>,
        subject_type: SubjectType,
        size: SizeInfo,
    ) -> Self {
        Self {
            timestamp,
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            subject_type,
            size,
            status: "completed".to_string(),
            operation: "move".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_serializes_with_type_field() {
        let entry = DeletionEntry::new(
            "a.txt",
            "/p/a.txt",
            SubjectType::File,
            SizeInfo::File { size_bytes: 3 },
        );
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["type"], "file");
        assert_eq!(json["confirmed"], false);
        assert_eq!(json["size"]["size_bytes"], 3);
        assert!(json.get("content_sha256").is_none());
    }

    #[test]
    fn rename_conflict_mirrors_dest_exists() {
        let target = RenameTarget {
            old_path: "a.txt".into(),
            old_full_path: "/p/a.txt".into(),
            new_path: "b.txt".into(),
            new_full_path: "/p/b.txt".into(),
            new_name: "b.txt".into(),
        };
        let entry = RenameEntry::new(
            target,
            SubjectType::File,
            SizeInfo::File { size_bytes: 1 },
            true,
        );

        assert!(entry.conflict);
        assert!(entry.dest_exists);
        assert!(!entry.confirmed);
    }

    #[test]
    fn kind_directories() {
        assert_eq!(EntryKind::Deletion.dir_name(), "deletion");
        assert_eq!(EntryKind::Rename.dir_name(), "rename");
        assert_eq!(EntryKind::Move.dir_name(), "move_completed");
        assert_eq!(EntryKind::Move.file_prefix(), "move");
    }
}
