//! Short-lived on-disk copy of an upload under inspection.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

/// Uniquely named file that is removed when dropped, whatever the outcome
/// of the validation that used it.
#[derive(Debug)]
pub struct ScratchFile {
    file: Option<NamedTempFile>,
}

impl ScratchFile {
    /// Write `bytes` to a new `upload_*.tmp` file inside `dir`
    pub fn create(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("upload_")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file: Some(file) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(NamedTempFile::path)
    }

    /// Read back at most `limit` leading bytes
    pub fn read_header(&self, limit: usize) -> io::Result<Vec<u8>> {
        let path = self
            .path()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "scratch file released"))?;

        let mut header = Vec::with_capacity(limit.min(64 * 1024));
        File::open(path)?
            .take(limit as u64)
            .read_to_end(&mut header)?;
        Ok(header)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                warn!("Failed to remove scratch file {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scratch_file_lifecycle() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchFile::create(dir.path(), b"hello scratch").unwrap();

        let path = scratch.path().unwrap().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("upload_"));
        assert!(name.ends_with(".tmp"));
        assert!(path.exists());

        assert_eq!(scratch.read_header(5).unwrap(), b"hello");
        assert_eq!(scratch.read_header(1024).unwrap(), b"hello scratch");

        drop(scratch);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scratch_names_are_unique() {
        let dir = TempDir::new().unwrap();
        let a = ScratchFile::create(dir.path(), b"a").unwrap();
        let b = ScratchFile::create(dir.path(), b"a").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(ScratchFile::create(&missing, b"x").is_err());
    }
}
