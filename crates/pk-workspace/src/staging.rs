// staging.rs: Shadow tree for edits that could not be applied directly.
//
// Layout: `<base>/.staging/<subdir>/<relative-path>`. Each project gets its
// own subdir so two projects never share staged files.
//
// Key design:
// - Staging the same path again overwrites the previous content (last write wins)
// - Staged files are never expired or cleaned up here; a human removes them
// - Parent directories are created on demand, nothing is created eagerly

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::WorkspaceError;

/// Name of the staging root under the base directory.
pub const STAGING_DIR: &str = ".staging";

/// Why content was staged instead of written to the live file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageReason {
    /// The live file was open or locked elsewhere.
    Locked,
    /// The caller explicitly asked for a staged copy.
    Requested,
}

/// Result of a successful staging write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Path relative to the project root, `/`-separated.
    pub relative_path: String,
    /// Location relative to the base dir, e.g. `.staging/web/src/app.ts`.
    pub location: String,
    /// Absolute path of the staged copy.
    pub path: PathBuf,
    pub reason: StageReason,
}

impl StagedFile {
    /// Human-readable confirmation for the caller.
    pub fn describe(&self, project_label: &str) -> String {
        let note = match self.reason {
            StageReason::Locked => {
                "File was open/locked, so changes were staged for manual review."
            }
            StageReason::Requested => "Review the staged copy and apply it manually when ready.",
        };
        format!(
            "{} file staged successfully at {}\n{}",
            project_label, self.location, note
        )
    }
}

/// The staging area for one project.
#[derive(Debug, Clone)]
pub struct StagingStore {
    subdir: String,
    staging_dir: PathBuf,
}

impl StagingStore {
    /// Create a store rooted at `<base_dir>/.staging/<subdir>`.
    pub fn new(base_dir: impl AsRef<Path>, subdir: impl Into<String>) -> Self {
        let subdir = subdir.into();
        let staging_dir = base_dir.as_ref().join(STAGING_DIR).join(&subdir);
        Self {
            subdir,
            staging_dir,
        }
    }

    /// Absolute path of this project's staging directory.
    pub fn staging_path(&self) -> &Path {
        &self.staging_dir
    }

    /// Write `content` as the staged copy of `relative_path`, replacing any
    /// earlier staged copy.
    pub fn stage(
        &self,
        relative_path: &str,
        content: &str,
        reason: StageReason,
    ) -> Result<StagedFile, WorkspaceError> {
        let (relative_path, full_path) = self.resolve_path(relative_path)?;

        // Ensure parent directories exist.
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|source| WorkspaceError::IoError {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&full_path, content).map_err(|source| WorkspaceError::IoError {
            path: full_path.clone(),
            source,
        })?;

        tracing::info!(path = %relative_path, subdir = %self.subdir, ?reason, "staged file");

        Ok(StagedFile {
            location: format!("{}/{}/{}", STAGING_DIR, self.subdir, relative_path),
            relative_path,
            path: full_path,
            reason,
        })
    }

    /// Read a staged file as text.
    pub fn read_file(&self, relative_path: &str) -> Result<String, WorkspaceError> {
        let (relative_path, full_path) = self.resolve_path(relative_path)?;

        if !full_path.is_file() {
            return Err(WorkspaceError::FileNotFound {
                path: format!("{}/{}/{}", STAGING_DIR, self.subdir, relative_path),
            });
        }

        let bytes = fs::read(&full_path).map_err(|source| WorkspaceError::IoError {
            path: full_path,
            source,
        })?;
        String::from_utf8(bytes).map_err(|source| WorkspaceError::NotText {
            path: relative_path,
            source,
        })
    }

    /// Replace every occurrence of `find` in a staged file and re-stage it.
    pub fn replace_in_file(
        &self,
        relative_path: &str,
        find: &str,
        replace: &str,
    ) -> Result<StagedFile, WorkspaceError> {
        let current = self.read_file(relative_path)?;
        if find.is_empty() || !current.contains(find) {
            return Err(WorkspaceError::PatternNotFound {
                path: relative_path.to_string(),
                pattern: find.to_string(),
            });
        }

        let updated = current.replace(find, replace);
        self.stage(relative_path, &updated, StageReason::Requested)
    }

    /// List all staged files (relative paths, `/`-separated, sorted).
    pub fn list_files(&self) -> Result<Vec<String>, WorkspaceError> {
        let mut files = Vec::new();
        walk_dir(&self.staging_dir, &self.staging_dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// Resolve a relative path inside the staging dir. Rejects absolute
    /// paths and `..` so reviewer tools cannot reach outside it.
    fn resolve_path(&self, relative_path: &str) -> Result<(String, PathBuf), WorkspaceError> {
        let mut parts = Vec::new();
        for component in Path::new(relative_path).components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(WorkspaceError::PathTraversal {
                        path: relative_path.to_string(),
                        root: self.staging_dir.clone(),
                    });
                }
            }
        }

        if parts.is_empty() {
            return Err(WorkspaceError::InvalidPath {
                path: relative_path.to_string(),
                reason: "staged path must name a file".to_string(),
            });
        }

        let full_path = parts
            .iter()
            .fold(self.staging_dir.clone(), |acc, part| acc.join(part));
        Ok((parts.join("/"), full_path))
    }
}

/// Recursively walk a directory and collect relative file paths.
fn walk_dir(dir: &Path, root: &Path, files: &mut Vec<String>) -> Result<(), WorkspaceError> {
    if !dir.exists() {
        return Ok(());
    }

    let entries = fs::read_dir(dir).map_err(|source| WorkspaceError::IoError {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| WorkspaceError::IoError {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            walk_dir(&path, root, files)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(rel);
        }
    }

    Ok(())
}
