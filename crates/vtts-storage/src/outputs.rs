//! Filesystem store for composed output files.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Metadata for one stored output file.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// One page of an output listing, newest first.
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub files: Vec<StoredFile>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Store rooted at the server's outputs directory.
///
/// All access goes through [`OutputStore::resolve`], which confines names to
/// the root; callers can never reach outside it.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    /// Open the store, creating the root directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "output store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored file name to its path, rejecting traversal.
    pub fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(StorageError::not_found(name));
        }
        Ok(path)
    }

    /// Save bytes under `filename`, renaming on collision.
    ///
    /// Writes to a temp file in the root first and renames into place, so a
    /// concurrent reader never observes a partial file. Returns the name
    /// actually used.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> StorageResult<String> {
        validate_name(filename)?;

        let final_name = self.collision_free_name(filename).await;
        let final_path = self.root.join(&final_name);
        let tmp_path = self.root.join(format!(".{final_name}.tmp"));

        fs::write(&tmp_path, bytes).await?;
        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(name = %final_name, bytes = bytes.len(), "saved output");
        Ok(final_name)
    }

    /// List stored files, newest first, one page at a time.
    pub async fn list(&self, page: usize, per_page: usize) -> StorageResult<StoredPage> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push(StoredFile {
                name,
                size_bytes: meta.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified).then(a.name.cmp(&b.name)));
        let total = files.len();

        let per_page = per_page.max(1);
        let start = page.saturating_mul(per_page).min(total);
        let end = (start + per_page).min(total);
        files.drain(end..);
        files.drain(..start);

        Ok(StoredPage {
            files,
            total,
            page,
            per_page,
        })
    }

    /// Delete one stored file.
    pub async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).await?;
        info!(name, "deleted output");
        Ok(())
    }

    async fn collision_free_name(&self, filename: &str) -> String {
        if !self.root.join(filename).exists() {
            return filename.to_string();
        }

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (filename, None),
        };
        for n in 1.. {
            let candidate = match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            if !self.root.join(&candidate).exists() {
                return candidate;
            }
        }
        unreachable!("collision counter exhausted");
    }
}

/// Remove leftover upload scope directories older than `max_age`.
///
/// Covers crashes that skipped the normal drop-based cleanup. Failures are
/// logged and swallowed; this is a best-effort sweep.
pub async fn cleanup_stale_uploads(max_age: Duration) {
    let tmp = std::env::temp_dir();
    let Ok(mut entries) = fs::read_dir(&tmp).await else {
        return;
    };

    let now = SystemTime::now();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with("vtts-upload-") {
            continue;
        }
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age > max_age {
            if let Err(e) = fs::remove_dir_all(entry.path()).await {
                warn!(dir = %name, error = %e, "failed to sweep stale upload dir");
            } else {
                info!(dir = %name, "swept stale upload dir");
            }
        }
    }
}

/// Reject names that could escape the store root.
pub fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(StorageError::invalid_name(name));
    }
    Ok(())
}
