//! Request-scoped temp storage for uploaded segments.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::AudioResult;

/// Holds uploaded segment files for the lifetime of one request.
///
/// The backing directory is removed when the scope is dropped, on success
/// and failure paths alike.
#[derive(Debug)]
pub struct UploadScope {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl UploadScope {
    /// Create an empty scope under the system temp directory.
    pub fn new() -> AudioResult<Self> {
        let dir = tempfile::Builder::new().prefix("vtts-upload-").tempdir()?;
        debug!(path = %dir.path().display(), "created upload scope");
        Ok(Self {
            dir,
            files: Vec::new(),
        })
    }

    /// Persist one uploaded file into the scope, in arrival order.
    pub fn persist(&mut self, name: &str, bytes: &[u8]) -> AudioResult<PathBuf> {
        // Uploads are addressed by index; the original name only survives
        // as a suffix for diagnostics.
        let file_name = format!("{:03}_{}", self.files.len(), safe_name(name));
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, bytes)?;
        self.files.push(path.clone());
        Ok(path)
    }

    /// Uploaded file paths, in arrival order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Scope directory, for callers that need scratch space alongside uploads.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn safe_name(name: &str) -> String {
    let cleaned: String = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_kept_in_arrival_order() {
        let mut scope = UploadScope::new().unwrap();
        scope.persist("b.wav", b"two").unwrap();
        scope.persist("a.wav", b"one").unwrap();

        let files = scope.files();
        assert_eq!(files.len(), 2);
        assert!(files[0].file_name().unwrap().to_string_lossy().contains("b.wav"));
        assert!(files[1].file_name().unwrap().to_string_lossy().contains("a.wav"));
        assert_eq!(std::fs::read(&files[0]).unwrap(), b"two");
    }

    #[test]
    fn test_directory_removed_on_drop() {
        let path;
        {
            let mut scope = UploadScope::new().unwrap();
            scope.persist("x.wav", b"data").unwrap();
            path = scope.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_traversal_names_neutralized() {
        let mut scope = UploadScope::new().unwrap();
        let path = scope.persist("../../etc/passwd", b"x").unwrap();
        assert!(path.starts_with(scope.path()));
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("passwd"));
    }
}
