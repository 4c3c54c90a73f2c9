//! Small file-reading helpers shared by the loaders.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};

/// Return `path` if it is an existing file, [`DataError::MissingFile`]
/// otherwise.
///
/// Used after the cache-hit check: an absent file inside a populated-looking
/// directory means an earlier fetch was interrupted.
pub(crate) fn require_file(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(DataError::MissingFile(path))
    }
}

/// Read a whole file as ISO-8859-1 text.
///
/// Every Latin-1 byte is the Unicode scalar with the same value, so the
/// decode is a plain byte-to-char widening. Description and station files
/// upstream use this encoding, not UTF-8.
pub(crate) fn read_latin1(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_file_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Coffee_TRAIN.arff");

        let err = require_file(path.clone()).unwrap_err();
        assert!(matches!(err, DataError::MissingFile(p) if p == path));

        fs::write(&path, b"@relation coffee").unwrap();
        assert_eq!(require_file(path.clone()).unwrap(), path);
    }

    #[test]
    fn latin1_bytes_decode_to_matching_code_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        // "température" with a latin-1 encoded e-acute (0xe9)
        fs::write(&path, b"temp\xe9rature").unwrap();

        assert_eq!(read_latin1(&path).unwrap(), "température");
    }
}
