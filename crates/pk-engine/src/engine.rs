// engine.rs: MutationEngine, the safety-gated operations on one project.
//
// Read path:  validate → filesystem
// Write path: validate → lock probe → { direct write | staging }
// Destructive: validate → audit log (delete, rename never touch the tree)
//              validate → move → audit log
//
// Generic over `P: LockProbe` so tests can simulate a locked file; the
// default is the real append-open probe.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::Local;

use pk_audit::{
    hasher, scan, AuditLogWriter, DeletionEntry, DeletionSummary, EntryKind, LogFile, MoveEntry,
    MoveSummary, RenameEntry, RenameSummary, RenameTarget, SubjectType,
};
use pk_workspace::tree::{self, DirectoryTree};
use pk_workspace::{
    is_lock_error, AppendProbe, LockProbe, PathGuard, SizeInfo, SkipRules, StageReason,
    StagedFile, StagingStore, ValidatedPath,
};

use crate::error::EngineError;
use crate::listing;
use crate::outcome::{CompletedMove, Created, EditOutcome, MarkedForDeletion, StagedRename};
use crate::profile::ProjectProfile;

/// How `edit` combines new content with what is already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Truncate and write.
    Replace,
    /// Keep the existing text and add the new content on a new line.
    Append,
}

impl FromStr for EditMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(EditMode::Replace),
            "append" => Ok(EditMode::Append),
            other => Err(EngineError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EditMode::Replace => "replace",
            EditMode::Append => "append",
        })
    }
}

/// The operations an agent may perform on one project root.
pub struct MutationEngine<P: LockProbe = AppendProbe> {
    profile: ProjectProfile,
    guard: PathGuard,
    staging: StagingStore,
    audit: AuditLogWriter,
    probe: P,
    skip_rules: SkipRules,
}

impl MutationEngine<AppendProbe> {
    /// Manage `project_root`, keeping staged files and logs under `base_dir`.
    pub fn new(
        profile: ProjectProfile,
        project_root: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<Self, EngineError> {
        Self::with_probe(profile, project_root, base_dir, AppendProbe)
    }
}

impl<P: LockProbe> MutationEngine<P> {
    /// Like [`MutationEngine::new`] with a custom lock probe.
    pub fn with_probe(
        profile: ProjectProfile,
        project_root: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
        probe: P,
    ) -> Result<Self, EngineError> {
        let guard = PathGuard::new(project_root.as_ref())?;
        let base_dir = base_dir.as_ref();
        let staging = StagingStore::new(base_dir, profile.staging_subdir.clone());
        let audit = AuditLogWriter::new(base_dir, profile.staging_subdir.clone());

        tracing::info!(
            project = %profile.label,
            root = %guard.root().display(),
            subdir = %profile.staging_subdir,
            "project engine ready"
        );

        Ok(Self {
            profile,
            guard,
            staging,
            audit,
            probe,
            skip_rules: SkipRules::default(),
        })
    }

    pub fn profile(&self) -> &ProjectProfile {
        &self.profile
    }

    /// The canonical project root.
    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    // ── Read ───────────────────────────────────────────────────────────

    /// Full text of a file.
    pub fn read(&self, path: &str) -> Result<String, EngineError> {
        let target = self.guard.validate(path)?;
        let rel = target.display_relative();
        let abs = target.absolute();

        if !abs.exists() {
            return Err(EngineError::NotFound { path: rel });
        }
        if abs.is_dir() {
            return Err(EngineError::TypeMismatch {
                path: rel,
                expected: "file",
            });
        }

        read_text(abs, &rel)
    }

    /// Recursive listing of `dir` (`.` for the whole project).
    pub fn read_directory(
        &self,
        dir: &str,
        include_content: bool,
    ) -> Result<DirectoryTree, EngineError> {
        let target = self.guard.validate(dir)?;
        let abs = target.absolute();

        if !abs.exists() {
            return Err(EngineError::NotFound {
                path: target.display_relative(),
            });
        }
        if !abs.is_dir() {
            return Err(EngineError::TypeMismatch {
                path: target.display_relative(),
                expected: "directory",
            });
        }

        Ok(tree::read_tree(
            self.guard.root(),
            abs,
            include_content,
            &self.skip_rules,
        ))
    }

    // ── Write ──────────────────────────────────────────────────────────

    /// Write `content` to a file, or stage it when the file looks locked.
    ///
    /// In append mode the staged copy holds the full composed text, so the
    /// reviewer can apply it with a single copy.
    pub fn edit(
        &self,
        path: &str,
        content: &str,
        mode: EditMode,
    ) -> Result<EditOutcome, EngineError> {
        let target = self.file_target(path)?;
        let rel = target.display_relative();
        let abs = target.absolute();

        if !self.probe.is_editable(abs) {
            tracing::warn!(path = %rel, "file looks locked, staging edit");
            return self.stage_locked(abs, &rel, content, mode);
        }

        match write_direct(&self.probe, abs, content, mode) {
            Ok(()) => {
                tracing::debug!(path = %rel, %mode, "file updated");
                Ok(EditOutcome::Applied { path: rel, mode })
            }
            Err(e) if is_lock_error(&e) => {
                tracing::warn!(path = %rel, error = %e, "write hit a lock, staging edit");
                self.stage_locked(abs, &rel, content, mode)
            }
            Err(source) => Err(EngineError::Io {
                path: abs.to_path_buf(),
                source,
            }),
        }
    }

    /// Stage `content` for manual review without touching the live file.
    pub fn stage_edit(&self, path: &str, content: &str) -> Result<StagedFile, EngineError> {
        let target = self.file_target(path)?;
        Ok(self
            .staging
            .stage(&target.display_relative(), content, StageReason::Requested)?)
    }

    /// Create a folder (idempotent) or a file with `content`, creating
    /// parent folders as needed. An existing file is overwritten.
    pub fn create(
        &self,
        path: &str,
        is_folder: bool,
        content: &str,
    ) -> Result<Created, EngineError> {
        let target = self.guard.validate(path)?;
        let rel = target.display_relative();
        let abs = target.absolute();

        if is_folder {
            fs::create_dir_all(abs).map_err(|source| EngineError::Io {
                path: abs.to_path_buf(),
                source,
            })?;
        } else {
            if target.is_root() || abs.is_dir() {
                return Err(EngineError::TypeMismatch {
                    path: rel,
                    expected: "file",
                });
            }
            create_parent(abs)?;
            fs::write(abs, content).map_err(|source| EngineError::Io {
                path: abs.to_path_buf(),
                source,
            })?;
        }

        tracing::debug!(path = %rel, is_folder, "created");
        Ok(Created {
            path: rel,
            is_folder,
        })
    }

    // ── Destructive (logged) ───────────────────────────────────────────

    /// Record a deletion request. The path is left in place.
    pub fn delete(&self, path: &str) -> Result<MarkedForDeletion, EngineError> {
        let target = self.existing_subject(path)?;
        let rel = target.display_relative();
        let abs = target.absolute();
        let subject_type = subject_type(abs);

        let size = SizeInfo::inspect(abs);
        let bytes = size.total_bytes();
        let mut entry = DeletionEntry::new(&rel, abs, subject_type, size);
        if subject_type == SubjectType::File {
            match hasher::hash_file(abs) {
                Ok(hash) => entry = entry.with_content_hash(hash),
                Err(e) => tracing::debug!(path = %rel, error = %e, "could not fingerprint file"),
            }
        }

        let log = self.audit.write(&entry)?;
        tracing::info!(path = %rel, bytes, log = %log.location, "marked for deletion");

        Ok(MarkedForDeletion {
            path: rel,
            subject_type,
            log,
        })
    }

    /// Record a request to rename `old_path` to `new_name` in the same
    /// folder. Neither path is changed; an existing destination is flagged.
    pub fn rename(&self, old_path: &str, new_name: &str) -> Result<StagedRename, EngineError> {
        let source = self.existing_subject(old_path)?;
        if !is_plain_name(new_name) {
            return Err(EngineError::InvalidPath {
                path: new_name.to_string(),
                reason: "the new name must be a single path component".to_string(),
            });
        }

        let old_rel = source.display_relative();
        let new_rel = match source.relative().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                format!("{}/{}", display_path(parent), new_name)
            }
            _ => new_name.to_string(),
        };
        let dest = self.guard.validate(&new_rel)?;

        let abs = source.absolute();
        let subject_type = subject_type(abs);
        let dest_exists = fs::symlink_metadata(dest.absolute()).is_ok();

        let entry = RenameEntry::new(
            RenameTarget {
                old_path: old_rel.clone(),
                old_full_path: abs.to_path_buf(),
                new_path: dest.display_relative(),
                new_full_path: dest.absolute().to_path_buf(),
                new_name: new_name.to_string(),
            },
            subject_type,
            SizeInfo::inspect(abs),
            dest_exists,
        );

        let log = self.audit.write(&entry)?;
        if dest_exists {
            tracing::warn!(path = %old_rel, new_name, "rename requested onto an existing path");
        }
        tracing::info!(path = %old_rel, new_name, log = %log.location, "staged for rename");

        Ok(StagedRename {
            old_path: old_rel,
            new_name: new_name.to_string(),
            subject_type,
            conflict: dest_exists,
            log,
        })
    }

    /// Move `source` to `dest` now and log it. Never overwrites.
    ///
    /// Uses a plain rename, so moving across filesystems fails with an I/O
    /// error and leaves the source in place.
    pub fn move_path(&self, source: &str, dest: &str) -> Result<CompletedMove, EngineError> {
        let src = self.existing_subject(source)?;
        let dst = self.guard.validate(dest)?;
        let src_rel = src.display_relative();
        let dst_rel = dst.display_relative();

        if dst.is_root() || fs::symlink_metadata(dst.absolute()).is_ok() {
            return Err(EngineError::Conflict { path: dst_rel });
        }
        if dst.absolute().starts_with(src.absolute()) {
            return Err(EngineError::InvalidPath {
                path: dst_rel,
                reason: "the destination lies inside the source".to_string(),
            });
        }

        // Measured before the move so the log reflects what was moved.
        let started = Local::now();
        let subject_type = subject_type(src.absolute());
        let size = SizeInfo::inspect(src.absolute());

        // Everything the log write needs exists before the tree changes.
        let entry = MoveEntry::completed(started, &src_rel, &dst_rel, subject_type, size);
        self.audit.prepare(EntryKind::Move)?;
        create_parent(dst.absolute())?;

        fs::rename(src.absolute(), dst.absolute()).map_err(|source| EngineError::Io {
            path: src.absolute().to_path_buf(),
            source,
        })?;
        tracing::info!(
            from = %src_rel,
            to = %dst_rel,
            bytes = entry.size.total_bytes(),
            "moved"
        );

        let log = self.audit.write(&entry).map_err(|e| {
            tracing::error!(from = %src_rel, to = %dst_rel, error = %e, "move completed but was not logged");
            e
        })?;

        Ok(CompletedMove {
            source: src_rel,
            destination: dst_rel,
            subject_type,
            log,
        })
    }

    // ── Listings ───────────────────────────────────────────────────────

    pub fn pending_deletions(&self) -> Result<Vec<LogFile<DeletionSummary>>, EngineError> {
        Ok(scan(&self.audit.kind_dir(EntryKind::Deletion), "deletion_")?)
    }

    pub fn pending_renames(&self) -> Result<Vec<LogFile<RenameSummary>>, EngineError> {
        Ok(scan(&self.audit.kind_dir(EntryKind::Rename), "rename_")?)
    }

    /// Completed moves, then moves staged by older releases.
    #[allow(clippy::type_complexity)]
    pub fn recorded_moves(
        &self,
    ) -> Result<(Vec<LogFile<MoveSummary>>, Vec<LogFile<MoveSummary>>), EngineError> {
        let completed = scan(&self.audit.kind_dir(EntryKind::Move), "move_")?;
        let legacy = scan(&self.audit.legacy_move_dir(), "move_")?;
        Ok((completed, legacy))
    }

    pub fn list_deletions(&self) -> Result<String, EngineError> {
        Ok(listing::deletions(
            &self.profile.label,
            &self.profile.staging_subdir,
            &self.pending_deletions()?,
        ))
    }

    pub fn list_renames(&self) -> Result<String, EngineError> {
        Ok(listing::renames(
            &self.profile.label,
            &self.profile.staging_subdir,
            &self.pending_renames()?,
        ))
    }

    pub fn list_moves(&self) -> Result<String, EngineError> {
        let (completed, legacy) = self.recorded_moves()?;
        Ok(listing::moves(
            &self.profile.label,
            &self.profile.staging_subdir,
            &completed,
            &legacy,
        ))
    }

    // ── Staged review ──────────────────────────────────────────────────

    pub fn list_staged_files(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.staging.list_files()?)
    }

    pub fn read_staged_file(&self, path: &str) -> Result<String, EngineError> {
        Ok(self.staging.read_file(path)?)
    }

    /// Replace every occurrence of `find` in a staged copy.
    pub fn edit_staged_file(
        &self,
        path: &str,
        find: &str,
        replace: &str,
    ) -> Result<StagedFile, EngineError> {
        Ok(self.staging.replace_in_file(path, find, replace)?)
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// A validated path that may name a file: not the root, not a folder.
    fn file_target(&self, path: &str) -> Result<ValidatedPath, EngineError> {
        let target = self.guard.validate(path)?;
        if target.is_root() || target.absolute().is_dir() {
            return Err(EngineError::TypeMismatch {
                path: target.display_relative(),
                expected: "file",
            });
        }
        Ok(target)
    }

    /// A validated, existing path other than the project root.
    fn existing_subject(&self, path: &str) -> Result<ValidatedPath, EngineError> {
        let target = self.guard.validate(path)?;
        if target.is_root() {
            return Err(EngineError::InvalidPath {
                path: path.to_string(),
                reason: "the project root itself cannot be deleted, renamed or moved"
                    .to_string(),
            });
        }
        if fs::symlink_metadata(target.absolute()).is_err() {
            return Err(EngineError::NotFound {
                path: target.display_relative(),
            });
        }
        Ok(target)
    }

    fn stage_locked(
        &self,
        abs: &Path,
        rel: &str,
        content: &str,
        mode: EditMode,
    ) -> Result<EditOutcome, EngineError> {
        let composed = match mode {
            EditMode::Replace => content.to_string(),
            EditMode::Append => {
                let existing = if abs.exists() {
                    read_text(abs, rel)?
                } else {
                    String::new()
                };
                append_to(&existing, content)
            }
        };
        let staged = self.staging.stage(rel, &composed, StageReason::Locked)?;
        Ok(EditOutcome::Staged(staged))
    }
}

/// `existing` followed by `addition` on a new line; just `addition` when
/// there is nothing to append to.
///
/// An empty or missing file yields `addition` with no leading newline. The
/// direct append in `write_direct` follows the same rule, so a staged append
/// always holds what the direct write would have produced.
fn append_to(existing: &str, addition: &str) -> String {
    if existing.is_empty() {
        addition.to_string()
    } else {
        format!("{}\n{}", existing, addition)
    }
}

fn write_direct<P: LockProbe>(
    probe: &P,
    abs: &Path,
    content: &str,
    mode: EditMode,
) -> io::Result<()> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)?;
    }
    match mode {
        EditMode::Replace => probe.open_for_write(abs, false)?.write_all(content.as_bytes()),
        EditMode::Append => {
            let has_content = fs::metadata(abs).map(|m| m.len() > 0).unwrap_or(false);
            let mut file = probe.open_for_write(abs, true)?;
            if has_content {
                file.write_all(b"\n")?;
            }
            file.write_all(content.as_bytes())
        }
    }
}

fn read_text(abs: &Path, rel: &str) -> Result<String, EngineError> {
    let bytes = fs::read(abs).map_err(|source| EngineError::Io {
        path: abs.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| EngineError::NotText {
        path: rel.to_string(),
    })
}

fn create_parent(abs: &Path) -> Result<(), EngineError> {
    match abs.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| EngineError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

fn subject_type(abs: &Path) -> SubjectType {
    if abs.is_dir() {
        SubjectType::Directory
    } else {
        SubjectType::File
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
