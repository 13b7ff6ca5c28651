// guard.rs: Containment checks for caller-supplied paths.
//
// Every operation resolves its path through a PathGuard before touching the
// filesystem. The guard joins the relative path onto the canonical project
// root, folds `.` and `..` lexically (the target may not exist yet), and
// rejects anything that lands outside the root. When part of the path does
// exist, its canonical form is checked too, so a symlink inside the project
// cannot be used to reach files outside it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::WorkspaceError;

/// A path that passed the containment check.
///
/// Only produced by [`PathGuard::validate`]; `absolute` is always the project
/// root or a descendant of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    absolute: PathBuf,
    relative: PathBuf,
}

impl ValidatedPath {
    /// The resolved absolute path.
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// The normalized path relative to the project root (empty for the root).
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Relative path rendered with `/` separators, `.` for the root itself.
    pub fn display_relative(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }
        self.relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// True when the path resolved to the project root.
    pub fn is_root(&self) -> bool {
        self.relative.as_os_str().is_empty()
    }
}

/// Gatekeeper for one project root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for an existing directory. The root is canonicalized
    /// once here and never changes afterwards.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|source| WorkspaceError::IoError {
            path: root.to_path_buf(),
            source,
        })?;

        if !canonical.is_dir() {
            return Err(WorkspaceError::InvalidPath {
                path: root.display().to_string(),
                reason: "project root is not a directory".to_string(),
            });
        }

        Ok(Self { root: canonical })
    }

    /// The canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the root and check containment.
    ///
    /// A path that normalizes to exactly the root is valid.
    pub fn validate(&self, relative: &str) -> Result<ValidatedPath, WorkspaceError> {
        if relative.contains('\0') {
            return Err(WorkspaceError::InvalidPath {
                path: relative.to_string(),
                reason: "path contains a NUL byte".to_string(),
            });
        }

        let absolute = normalize(&self.root.join(relative));
        if !absolute.starts_with(&self.root) {
            return Err(self.traversal(relative));
        }

        if let Some(existing) = nearest_existing(&absolute) {
            let canonical =
                fs::canonicalize(existing).map_err(|e| WorkspaceError::InvalidPath {
                    path: relative.to_string(),
                    reason: e.to_string(),
                })?;
            if !canonical.starts_with(&self.root) {
                tracing::warn!(path = relative, resolved = %canonical.display(), "symlink escapes project root");
                return Err(self.traversal(relative));
            }
        }

        let relative_part = absolute
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| self.traversal(relative))?;

        Ok(ValidatedPath {
            absolute,
            relative: relative_part,
        })
    }

    fn traversal(&self, relative: &str) -> WorkspaceError {
        WorkspaceError::PathTraversal {
            path: relative.to_string(),
            root: self.root.clone(),
        }
    }
}

/// Lexically fold `.` and `..` components. `..` never climbs above the
/// filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root or a prefix.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The deepest ancestor of `path` (including itself) that exists on disk.
fn nearest_existing(path: &Path) -> Option<&Path> {
    path.ancestors()
        .find(|candidate| fs::symlink_metadata(candidate).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plain_relative_path_is_valid() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();

        let validated = guard.validate("src/main.rs").unwrap();
        assert!(validated.absolute().starts_with(guard.root()));
        assert_eq!(validated.display_relative(), "src/main.rs");
    }

    #[test]
    fn parent_segments_that_escape_are_rejected() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();

        for path in ["../escape.txt", "a/../../escape.txt", "../../../../etc/passwd", ".."] {
            let result = guard.validate(path);
            assert!(
                matches!(result, Err(WorkspaceError::PathTraversal { .. })),
                "expected traversal rejection for {path}"
            );
        }
    }

    #[test]
    fn parent_segments_that_stay_inside_are_folded() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();

        let validated = guard.validate("a/b/../c.txt").unwrap();
        assert_eq!(validated.display_relative(), "a/c.txt");
    }

    #[test]
    fn root_itself_is_valid() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();

        for path in [".", "", "sub/.."] {
            let validated = guard.validate(path).unwrap();
            assert!(validated.is_root());
            assert_eq!(validated.absolute(), guard.root());
            assert_eq!(validated.display_relative(), ".");
        }
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();

        let outside = other.path().join("x.txt");
        let result = guard.validate(outside.to_str().unwrap());
        assert!(matches!(result, Err(WorkspaceError::PathTraversal { .. })));
    }

    #[test]
    fn sibling_with_shared_prefix_is_rejected() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("proj");
        fs::create_dir(&root).unwrap();
        fs::create_dir(parent.path().join("proj2")).unwrap();
        let guard = PathGuard::new(&root).unwrap();

        let result = guard.validate("../proj2/file.txt");
        assert!(matches!(result, Err(WorkspaceError::PathTraversal { .. })));
    }

    #[test]
    fn nul_byte_is_invalid() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();

        let result = guard.validate("bad\0name.txt");
        assert!(matches!(result, Err(WorkspaceError::InvalidPath { .. })));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let result = PathGuard::new(dir.path().join("does-not-exist"));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_root_is_rejected() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();

        let result = guard.validate("link/secret.txt");
        assert!(matches!(result, Err(WorkspaceError::PathTraversal { .. })));
    }
}
