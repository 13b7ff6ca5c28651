// size.rs: Size metadata attached to audit records.
//
// Directory sizes are computed by walking the whole tree synchronously, so
// the cost grows with the number of descendant files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tree::link_stays_inside;

/// Size of a file or directory at the moment an operation was logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizeInfo {
    File { size_bytes: u64 },
    Directory { total_size_bytes: u64, file_count: u64 },
    Unavailable { error: String },
}

impl SizeInfo {
    /// Measure `path`. Never fails; unreadable paths yield `Unavailable`.
    ///
    /// Files that vanish or cannot be stat'ed during a directory walk are
    /// skipped. Symlinked directories are not followed, and symlinks that
    /// resolve outside the measured directory are not counted.
    pub fn inspect(path: &Path) -> Self {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "size lookup failed");
                return SizeInfo::Unavailable {
                    error: "Unable to get size information".to_string(),
                };
            }
        };

        if !metadata.is_dir() {
            return SizeInfo::File {
                size_bytes: metadata.len(),
            };
        }

        let bound = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut total_size_bytes = 0;
        let mut file_count = 0;
        walk(path, &bound, &mut total_size_bytes, &mut file_count);
        SizeInfo::Directory {
            total_size_bytes,
            file_count,
        }
    }

    /// Total bytes covered, zero when unknown.
    pub fn total_bytes(&self) -> u64 {
        match self {
            SizeInfo::File { size_bytes } => *size_bytes,
            SizeInfo::Directory {
                total_size_bytes, ..
            } => *total_size_bytes,
            SizeInfo::Unavailable { .. } => 0,
        }
    }
}

fn walk(dir: &Path, bound: &Path, total: &mut u64, count: &mut u64) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            walk(&path, bound, total, count);
            continue;
        }
        if file_type.is_symlink() && !link_stays_inside(&path, bound) {
            continue;
        }

        // Follows file symlinks, skips symlinks that point at directories.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(meta) => {
                *total += meta.len();
                *count += 1;
            }
            Err(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"hello").unwrap();

        assert_eq!(SizeInfo::inspect(&path), SizeInfo::File { size_bytes: 5 });
    }

    #[test]
    fn directory_totals_are_recursive() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("data");
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("ten.bin"), vec![0u8; 10]).unwrap();
        fs::write(root.join("nested/twenty.bin"), vec![0u8; 20]).unwrap();
        fs::write(root.join("nested/deeper/thirty.bin"), vec![0u8; 30]).unwrap();

        assert_eq!(
            SizeInfo::inspect(&root),
            SizeInfo::Directory {
                total_size_bytes: 60,
                file_count: 3
            }
        );
    }

    #[test]
    fn empty_directory() {
        let dir = tempdir().unwrap();
        assert_eq!(
            SizeInfo::inspect(dir.path()),
            SizeInfo::Directory {
                total_size_bytes: 0,
                file_count: 0
            }
        );
    }

    #[test]
    fn missing_path_is_unavailable() {
        let dir = tempdir().unwrap();
        let info = SizeInfo::inspect(&dir.path().join("gone"));
        assert!(matches!(info, SizeInfo::Unavailable { .. }));
        assert_eq!(info.total_bytes(), 0);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(SizeInfo::Directory {
            total_size_bytes: 60,
            file_count: 3,
        })
        .unwrap();
        assert_eq!(json["type"], "directory");
        assert_eq!(json["total_size_bytes"], 60);
        assert_eq!(json["file_count"], 3);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_leaving_directory_is_not_counted() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let root = dir.path().join("data");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("ten.bin"), vec![0u8; 10]).unwrap();
        fs::write(outside.path().join("big.bin"), vec![0u8; 1000]).unwrap();
        let target = outside.path().join("big.bin");
        std::os::unix::fs::symlink(&target, root.join("link.bin")).unwrap();

        assert_eq!(
            SizeInfo::inspect(&root),
            SizeInfo::Directory {
                total_size_bytes: 10,
                file_count: 1
            }
        );
    }
}
