// writer.rs: Markdown audit log writer.
//
// One file per entry: `<base>/logs/<subdir>/<kind-dir>/<name>.md`, where the
// name is `<prefix>_<YYYY-MM-DD>_<sanitized path>[_to_<sanitized dest>].md`.
// Two requests for the same path on the same day share a name, and the later
// one replaces the earlier log. Suffixes longer than MAX_SUFFIX_BYTES are cut
// and tagged with a hash of the full suffix so names stay under the 255-byte
// file name limit and remain unique.
//
// Each log carries:
// - a summary block whose `- **Field**:` lines are read back by `summary`
// - the entry itself as a fenced JSON block
// - the shell commands a reviewer runs to carry the operation out
// - the recorded size

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};

use pk_workspace::SizeInfo;

use crate::entry::{DeletionEntry, EntryKind, MoveEntry, RenameEntry, SubjectType};
use crate::error::AuditError;
use crate::hasher::hash_bytes;

/// Longest sanitized path part kept verbatim in a log file name.
pub const MAX_SUFFIX_BYTES: usize = 150;

/// Hex digits of the suffix hash appended to a cut suffix.
const SUFFIX_HASH_LEN: usize = 12;

/// Summary line prefixes shared with the log parser.
pub(crate) mod field {
    pub const PATH: &str = "- **Path**:";
    pub const TYPE: &str = "- **Type**:";
    pub const MARKED: &str = "- **Marked for deletion**:";
    pub const CURRENT_NAME: &str = "- **Current name**:";
    pub const NEW_NAME: &str = "- **New name**:";
    pub const STAGED: &str = "- **Staged**:";
    pub const CONFLICT: &str = "- **Destination exists**:";
    pub const SOURCE: &str = "- **Source**:";
    pub const DESTINATION: &str = "- **Destination**:";
    pub const COMPLETED: &str = "- **Completed**:";

    pub const CONFLICT_MARKER: &str = "WARNING - YES - Destination exists!";
}

/// Replace path separators and dots so a path can be embedded in a file name.
pub fn sanitize(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '/' | '\\' | '.' => '_',
            other => other,
        })
        .collect()
}

/// `suffix` unchanged when short enough, otherwise its first
/// `MAX_SUFFIX_BYTES` bytes (on a char boundary) plus a hash of the whole.
fn cap_suffix(suffix: String) -> String {
    if suffix.len() <= MAX_SUFFIX_BYTES {
        return suffix;
    }
    let mut cut = MAX_SUFFIX_BYTES;
    while !suffix.is_char_boundary(cut) {
        cut -= 1;
    }
    let hash = hash_bytes(suffix.as_bytes());
    format!("{}_{}", &suffix[..cut], &hash[..SUFFIX_HASH_LEN])
}

/// Local time rendered the way every log shows it.
pub(crate) fn display_time(ts: &DateTime<Local>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// An entry that can be written as a markdown log.
pub trait LogEntry: serde::Serialize {
    fn kind(&self) -> EntryKind;

    fn timestamp(&self) -> &DateTime<Local>;

    /// The sanitized part of the file name after the date.
    fn name_suffix(&self) -> String;

    /// Full markdown body. `log_location` is the log's own path relative to
    /// the base directory, used in the cleanup step.
    fn render(&self, details_json: &str, log_location: &str) -> String;
}

/// Where a log was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub kind: EntryKind,
    pub file_name: String,
    /// `logs/<subdir>/<kind-dir>/<file_name>`, relative to the base directory.
    pub location: String,
    pub path: PathBuf,
}

/// Writes audit logs for one project.
#[derive(Debug, Clone)]
pub struct AuditLogWriter {
    subdir: String,
    logs_dir: PathBuf,
}

impl AuditLogWriter {
    /// Logs go under `<base_dir>/logs/<subdir>/`. Nothing is created until
    /// the first write.
    pub fn new(base_dir: impl AsRef<Path>, subdir: impl Into<String>) -> Self {
        let subdir = subdir.into();
        let logs_dir = base_dir.as_ref().join("logs").join(&subdir);
        Self { subdir, logs_dir }
    }

    /// Directory holding logs of `kind`.
    pub fn kind_dir(&self, kind: EntryKind) -> PathBuf {
        self.logs_dir.join(kind.dir_name())
    }

    /// Directory of moves staged by older releases, before moves executed
    /// directly. Only ever read.
    pub fn legacy_move_dir(&self) -> PathBuf {
        self.logs_dir.join("move")
    }

    /// The file name `entry` will be written under.
    pub fn file_name<E: LogEntry>(&self, entry: &E) -> String {
        format!(
            "{}_{}_{}.md",
            entry.kind().file_prefix(),
            entry.timestamp().format("%Y-%m-%d"),
            cap_suffix(entry.name_suffix())
        )
    }

    /// Create the directory for `kind` logs. Callers that change the tree
    /// before logging run this first so the log write cannot fail on it.
    pub fn prepare(&self, kind: EntryKind) -> Result<PathBuf, AuditError> {
        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir).map_err(|source| AuditError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Render and write `entry`, creating directories as needed.
    pub fn write<E: LogEntry>(&self, entry: &E) -> Result<LogRecord, AuditError> {
        let kind = entry.kind();
        let dir = self.prepare(kind)?;

        let file_name = self.file_name(entry);
        let location = format!("logs/{}/{}/{}", self.subdir, kind.dir_name(), file_name);
        let details = serde_json::to_string_pretty(entry)?;
        let body = entry.render(&details, &location);

        let path = dir.join(&file_name);
        fs::write(&path, body).map_err(|source| AuditError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(kind = ?kind, log = %location, "audit log written");

        Ok(LogRecord {
            kind,
            file_name,
            location,
            path,
        })
    }
}

impl LogEntry for DeletionEntry {
    fn kind(&self) -> EntryKind {
        EntryKind::Deletion
    }

    fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    fn name_suffix(&self) -> String {
        sanitize(&self.path)
    }

    fn render(&self, details_json: &str, log_location: &str) -> String {
        let remove = match self.subject_type {
            SubjectType::File => format!("rm \"{}\"", self.path),
            SubjectType::Directory => format!("rm -rf \"{}\"", self.path),
        };
        let (hash_line, verify_step) = match &self.content_sha256 {
            Some(hash) => (
                format!("- **SHA-256**: `{}`\n", hash),
                format!(
                    "2. **Check the file is unchanged** since it was marked:\n   ```bash\n   sha256sum \"{}\"   # expect {}\n   ```\n",
                    self.path, hash
                ),
            ),
            None => (
                String::new(),
                "2. **Back up** anything inside that is worth keeping\n".to_string(),
            ),
        };

        format!(
            "# Deletion Request: {path}\n\n\
             ## Summary\n\
             {f_path} `{path}`\n\
             {f_type} {kind}\n\
             {f_marked} {ts}\n\
             {hash_line}\
             - **Status**: Pending manual confirmation\n\n\
             ## Details\n\
             ```json\n{details}\n```\n\n\
             ## Manual Steps\n\
             1. **Review** that this {kind} should really go\n\
             {verify_step}\
             3. **Delete** it from the project root:\n   ```bash\n   {remove}\n   ```\n\
             4. **Remove this log** once done:\n   ```bash\n   rm \"{log}\"\n   ```\n\n\
             ## Size Information\n\
             {size}\n",
            path = self.path,
            f_path = field::PATH,
            f_type = field::TYPE,
            f_marked = field::MARKED,
            kind = self.subject_type,
            ts = display_time(&self.timestamp),
            hash_line = hash_line,
            details = details_json,
            verify_step = verify_step,
            remove = remove,
            log = log_location,
            size = format_size_info(&self.size),
        )
    }
}

impl LogEntry for RenameEntry {
    fn kind(&self) -> EntryKind {
        EntryKind::Rename
    }

    fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    fn name_suffix(&self) -> String {
        format!("{}_to_{}", sanitize(&self.old_path), sanitize(&self.new_name))
    }

    fn render(&self, details_json: &str, log_location: &str) -> String {
        let conflict = if self.dest_exists {
            field::CONFLICT_MARKER
        } else {
            "No"
        };
        let conflict_note = if self.dest_exists {
            "\n> **Warning**: a path named `".to_string()
                + &self.new_path
                + "` already exists. Move or remove it before renaming.\n"
        } else {
            String::new()
        };

        format!(
            "# Rename Request: {old} -> {new_name}\n\n\
             ## Summary\n\
             {f_current} `{old}`\n\
             {f_new} `{new}`\n\
             {f_type} {kind}\n\
             {f_staged} {ts}\n\
             {f_conflict} {conflict}\n\
             - **Status**: Pending manual confirmation\n\
             {conflict_note}\n\
             ## Details\n\
             ```json\n{details}\n```\n\n\
             ## Manual Steps\n\
             1. **Review** the new name and check nothing refers to the old one\n\
             2. **Rename** from the project root:\n   ```bash\n   mv \"{old}\" \"{new}\"\n   ```\n   \
             or, in a git checkout:\n   ```bash\n   git mv \"{old}\" \"{new}\"\n   ```\n\
             3. **Remove this log** once done:\n   ```bash\n   rm \"{log}\"\n   ```\n\n\
             ## Size Information\n\
             {size}\n",
            old = self.old_path,
            new = self.new_path,
            new_name = self.new_name,
            f_current = field::CURRENT_NAME,
            f_new = field::NEW_NAME,
            f_type = field::TYPE,
            f_staged = field::STAGED,
            f_conflict = field::CONFLICT,
            kind = self.subject_type,
            ts = display_time(&self.timestamp),
            conflict = conflict,
            conflict_note = conflict_note,
            details = details_json,
            log = log_location,
            size = format_size_info(&self.size),
        )
    }
}

impl LogEntry for MoveEntry {
    fn kind(&self) -> EntryKind {
        EntryKind::Move
    }

    fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    fn name_suffix(&self) -> String {
        format!("{}_to_{}", sanitize(&self.source_path), sanitize(&self.dest_path))
    }

    fn render(&self, details_json: &str, log_location: &str) -> String {
        format!(
            "# Completed Move: {src} -> {dst}\n\n\
             ## Summary\n\
             {f_source} `{src}`\n\
             {f_dest} `{dst}`\n\
             {f_type} {kind}\n\
             {f_completed} {ts}\n\
             - **Status**: Completed\n\n\
             ## Details\n\
             ```json\n{details}\n```\n\n\
             ## Undo\n\
             The move has already happened. To reverse it, from the project root:\n   \
             ```bash\n   mv \"{dst}\" \"{src}\"\n   ```\n\
             This log can be removed once it is no longer needed:\n   \
             ```bash\n   rm \"{log}\"\n   ```\n\n\
             ## Size Information\n\
             {size}\n",
            src = self.source_path,
            dst = self.dest_path,
            f_source = field::SOURCE,
            f_dest = field::DESTINATION,
            f_type = field::TYPE,
            f_completed = field::COMPLETED,
            kind = self.subject_type,
            ts = display_time(&self.timestamp),
            details = details_json,
            log = log_location,
            size = format_size_info(&self.size),
        )
    }
}

/// Human-readable size block.
pub fn format_size_info(size: &SizeInfo) -> String {
    match size {
        SizeInfo::File { size_bytes } => format!(
            "- **Size**: {:.2} MB ({} bytes)",
            megabytes(*size_bytes),
            group_thousands(*size_bytes)
        ),
        SizeInfo::Directory {
            total_size_bytes,
            file_count,
        } => format!(
            "- **Total size**: {:.2} MB ({} bytes)\n- **File count**: {} files",
            megabytes(*total_size_bytes),
            group_thousands(*total_size_bytes),
            group_thousands(*file_count)
        ),
        SizeInfo::Unavailable { error } => format!("- **Size**: Unable to determine ({})", error),
    }
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// `1234567` -> `1,234,567`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
