// summary.rs: Read audit logs back into listings.
//
// Only the summary lines are parsed, so hand-edited details blocks do not
// break listings. A log that cannot be read or parsed is reported alongside
// the others rather than failing the whole listing.

use std::fs;
use std::path::Path;

use crate::error::AuditError;
use crate::writer::field;

/// One log file found by [`scan`], parsed or not.
#[derive(Debug)]
pub struct LogFile<T> {
    pub file_name: String,
    pub parsed: Result<T, AuditError>,
}

/// Fields shown for a pending deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionSummary {
    pub path: String,
    pub subject_type: String,
    pub marked_at: String,
}

/// Fields shown for a pending rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSummary {
    pub current_name: String,
    pub new_name: String,
    pub subject_type: String,
    pub staged_at: String,
    pub conflict: bool,
}

/// Fields shown for a move, completed or legacy-staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSummary {
    pub source: String,
    pub destination: String,
    pub subject_type: String,
    pub timestamp: String,
    /// Only ever set on legacy staged moves.
    pub conflict: bool,
}

/// Parse a log's markdown text.
pub trait FromLog: Sized {
    fn from_log(text: &str) -> Result<Self, AuditError>;
}

impl FromLog for DeletionSummary {
    fn from_log(text: &str) -> Result<Self, AuditError> {
        Ok(Self {
            path: code_field(text, field::PATH)?,
            subject_type: plain_field(text, field::TYPE),
            marked_at: plain_field(text, field::MARKED),
        })
    }
}

impl FromLog for RenameSummary {
    fn from_log(text: &str) -> Result<Self, AuditError> {
        Ok(Self {
            current_name: code_field(text, field::CURRENT_NAME)?,
            new_name: code_field(text, field::NEW_NAME)?,
            subject_type: plain_field(text, field::TYPE),
            staged_at: plain_field(text, field::STAGED),
            conflict: text.contains(field::CONFLICT_MARKER),
        })
    }
}

impl FromLog for MoveSummary {
    fn from_log(text: &str) -> Result<Self, AuditError> {
        // Legacy staged moves carry a "Staged" time instead of "Completed".
        let mut timestamp = plain_field(text, field::COMPLETED);
        if timestamp.is_empty() {
            timestamp = plain_field(text, field::STAGED);
        }
        Ok(Self {
            source: code_field(text, field::SOURCE)?,
            destination: code_field(text, field::DESTINATION)?,
            subject_type: plain_field(text, field::TYPE),
            timestamp,
            conflict: text.contains(field::CONFLICT_MARKER),
        })
    }
}

/// Parse every `<prefix>*.md` file in `dir`, sorted by file name.
///
/// A missing directory yields an empty listing.
pub fn scan<T: FromLog>(dir: &Path, prefix: &str) -> Result<Vec<LogFile<T>>, AuditError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| AuditError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(prefix) && name.ends_with(".md"))
        .collect();
    names.sort();

    Ok(names
        .into_iter()
        .map(|file_name| {
            let path = dir.join(&file_name);
            let parsed = fs::read_to_string(&path)
                .map_err(|source| AuditError::Io { path, source })
                .and_then(|text| T::from_log(&text));
            if let Err(e) = &parsed {
                tracing::warn!(file = %file_name, error = %e, "unreadable audit log");
            }
            LogFile { file_name, parsed }
        })
        .collect())
}

fn find_line<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.lines()
        .map(str::trim_start)
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
}

/// Value after the prefix, empty when the line is absent.
fn plain_field(text: &str, prefix: &str) -> String {
    find_line(text, prefix).unwrap_or_default().to_string()
}

/// Backtick-quoted value after the prefix.
fn code_field(text: &str, prefix: &str) -> Result<String, AuditError> {
    let malformed = || AuditError::MalformedLog {
        field: prefix.trim_start_matches("- ").to_string(),
    };
    let rest = find_line(text, prefix).ok_or_else(malformed)?;
    rest.split('`').nth(1).map(str::to_string).ok_or_else(malformed)
}
