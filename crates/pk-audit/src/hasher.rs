// hasher.rs: SHA-256 fingerprints for files named in deletion logs.
//
// A reviewer compares the recorded fingerprint with the file on disk before
// running the deletion, so a file that changed after it was marked is not
// removed by mistake.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::AuditError;

/// Lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Stream a file through SHA-256 without loading it into memory.
pub fn hash_file(path: &Path) -> Result<String, AuditError> {
    let mut file = File::open(path).map_err(|source| AuditError::HashFileFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|source| AuditError::HashFileFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn file_hash_matches_byte_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"hello world"));
    }

    #[test]
    fn missing_file_errors() {
        let dir = tempdir().unwrap();
        let result = hash_file(&dir.path().join("missing"));
        assert!(matches!(result, Err(AuditError::HashFileFailed { .. })));
    }
}
