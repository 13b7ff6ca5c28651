// probe.rs: Best-effort "is this file open elsewhere?" detection.
//
// The probe opens an existing file for appending and closes it immediately.
// On Windows this reliably fails while another program holds the file with
// an exclusive share mode; on Unix it fails for read-only files and busy
// executables. It cannot see advisory locks, and a lock taken after the
// probe returns is not detected. Callers use the answer only to choose
// between a direct write and staging, never for correctness.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Decides whether a live file may be written directly.
///
/// `Send + Sync` so one engine can be shared across tool handlers.
pub trait LockProbe: Send + Sync {
    /// True when `path` does not exist or can be opened for writing.
    fn is_editable(&self, path: &Path) -> bool;

    /// Open `path` for a direct write, creating it if missing. Replace
    /// truncates; append positions at the end.
    ///
    /// The error is what a lock taken after `is_editable` looks like, and
    /// the engine classifies it with [`is_lock_error`].
    fn open_for_write(&self, path: &Path, append: bool) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
    }
}

/// The real probe: open-for-append, then close.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppendProbe;

impl LockProbe for AppendProbe {
    fn is_editable(&self, path: &Path) -> bool {
        if !path.exists() {
            return true;
        }

        match OpenOptions::new().append(true).open(path) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "file is not editable");
                false
            }
        }
    }
}

/// Classify an I/O error raised mid-write as a lock/permission condition.
///
/// Uses error kinds and raw OS codes rather than message text, so the
/// answer does not depend on the OS locale.
pub fn is_lock_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    err.raw_os_error().is_some_and(is_lock_code)
}

#[cfg(unix)]
fn is_lock_code(code: i32) -> bool {
    matches!(
        code,
        libc::EBUSY | libc::ETXTBSY | libc::EACCES | libc::EPERM
    )
}

#[cfg(windows)]
fn is_lock_code(code: i32) -> bool {
    const ERROR_ACCESS_DENIED: i32 = 5;
    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_LOCK_VIOLATION: i32 = 33;
    matches!(
        code,
        ERROR_ACCESS_DENIED | ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION
    )
}

#[cfg(not(any(unix, windows)))]
fn is_lock_code(_code: i32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_editable() {
        let dir = tempdir().unwrap();
        assert!(AppendProbe.is_editable(&dir.path().join("new.txt")));
    }

    #[test]
    fn writable_file_is_editable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, b"content").unwrap();

        assert!(AppendProbe.is_editable(&path));
        // The probe must not change the file.
        assert_eq!(fs::read(&path).unwrap(), b"content");
    }

    #[test]
    fn directory_is_not_editable() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        assert!(!AppendProbe.is_editable(&sub));
    }

    #[test]
    fn permission_denied_is_a_lock_error() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(is_lock_error(&err));
    }

    #[test]
    fn not_found_is_not_a_lock_error() {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert!(!is_lock_error(&err));
    }

    #[cfg(unix)]
    #[test]
    fn busy_errno_is_a_lock_error() {
        assert!(is_lock_error(&io::Error::from_raw_os_error(libc::EBUSY)));
        assert!(is_lock_error(&io::Error::from_raw_os_error(libc::ETXTBSY)));
        assert!(!is_lock_error(&io::Error::from_raw_os_error(libc::ENOSPC)));
    }

    #[cfg(windows)]
    #[test]
    fn sharing_violation_is_a_lock_error() {
        assert!(is_lock_error(&io::Error::from_raw_os_error(32)));
        assert!(is_lock_error(&io::Error::from_raw_os_error(33)));
    }
}
