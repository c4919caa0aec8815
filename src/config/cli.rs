use crate::domain::ports::Storage;
use crate::utils::error::{RecoveryError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        fs::read(&full_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RecoveryError::MissingInput {
                path: full_path.display().to_string(),
            },
            _ => RecoveryError::IoError(e),
        })
    }

    /// Writes through a uniquely named sibling temp file and renames it into
    /// place, so readers never observe a half-written file and concurrent runs
    /// never share a temp file. The temp file is removed if the write fails.
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if full_path.file_name().is_none() {
            return Err(RecoveryError::ProcessingError {
                message: format!("Output path has no file name: {}", full_path.display()),
            });
        }

        let parent = match full_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(data)?;
        temp_file.flush()?;
        temp_file
            .persist(&full_path)
            .map_err(|e| RecoveryError::IoError(e.error))?;
        Ok(())
    }
}
