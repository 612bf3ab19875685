//! Voice reference store: audio file plus JSON metadata sidecar.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::info;

use vtts_models::VoiceInfo;

use crate::error::{StorageError, StorageResult};
use crate::outputs::validate_name;

const SIDECAR_EXT: &str = "json";

/// Store rooted at the server's voices directory.
///
/// Each voice is a reference audio file `<name>.<ext>` with a sidecar
/// `<name>.json` carrying its [`VoiceInfo`].
#[derive(Debug, Clone)]
pub struct VoiceStore {
    root: PathBuf,
}

impl VoiceStore {
    /// Open the store, creating the root directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "voice store ready");
        Ok(Self { root })
    }

    /// Register a new voice from uploaded reference audio.
    pub async fn create(
        &self,
        name: &str,
        audio_filename: &str,
        bytes: &[u8],
        description: Option<String>,
        language: Option<String>,
    ) -> StorageResult<VoiceInfo> {
        validate_voice_name(name)?;
        if self.sidecar_path(name).exists() {
            return Err(StorageError::VoiceExists(name.to_string()));
        }

        let ext = Path::new(audio_filename)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wav".to_string());
        let filename = format!("{name}.{ext}");

        fs::write(self.root.join(&filename), bytes).await?;

        let info = VoiceInfo {
            name: name.to_string(),
            filename,
            description,
            language,
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
        };
        self.write_sidecar(&info).await?;

        info!(voice = name, bytes = bytes.len(), "voice created");
        Ok(info)
    }

    /// Fetch one voice's metadata.
    pub async fn get(&self, name: &str) -> StorageResult<VoiceInfo> {
        validate_voice_name(name)?;
        let path = self.sidecar_path(name);
        let bytes = fs::read(&path)
            .await
            .map_err(|_| StorageError::VoiceNotFound(name.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Path to a voice's reference audio.
    pub async fn audio_path(&self, name: &str) -> StorageResult<PathBuf> {
        let info = self.get(name).await?;
        let path = self.root.join(&info.filename);
        if !path.is_file() {
            return Err(StorageError::VoiceNotFound(name.to_string()));
        }
        Ok(path)
    }

    /// List all voices, sorted by name.
    pub async fn list(&self) -> StorageResult<Vec<VoiceInfo>> {
        let mut voices = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SIDECAR_EXT) {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<VoiceInfo>(&bytes) {
                Ok(info) => voices.push(info),
                // A corrupt sidecar hides one voice, never the whole listing
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable voice sidecar"),
            }
        }
        voices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(voices)
    }

    /// Delete a voice and its reference audio.
    pub async fn delete(&self, name: &str) -> StorageResult<()> {
        let info = self.get(name).await?;
        let _ = fs::remove_file(self.root.join(&info.filename)).await;
        fs::remove_file(self.sidecar_path(name)).await?;
        info!(voice = name, "voice deleted");
        Ok(())
    }

    async fn write_sidecar(&self, info: &VoiceInfo) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(info)?;
        fs::write(self.sidecar_path(&info.name), json).await?;
        Ok(())
    }

    fn sidecar_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{SIDECAR_EXT}"))
    }
}

fn validate_voice_name(name: &str) -> StorageResult<()> {
    validate_name(name)?;
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StorageError::invalid_name(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, VoiceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VoiceStore::open(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_get_roundtrip() {
        let (_dir, store) = store().await;
        let created = store
            .create("narrator", "ref.wav", b"RIFF", Some("deep".into()), None)
            .await
            .unwrap();
        assert_eq!(created.filename, "narrator.wav");

        let fetched = store.get("narrator").await.unwrap();
        assert_eq!(fetched, created);

        let audio = store.audio_path("narrator").await.unwrap();
        assert_eq!(std::fs::read(audio).unwrap(), b"RIFF");
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let (_dir, store) = store().await;
        store
            .create("dup", "a.wav", b"x", None, None)
            .await
            .unwrap();
        assert!(matches!(
            store.create("dup", "b.wav", b"y", None, None).await,
            Err(StorageError::VoiceExists(_))
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_and_delete() {
        let (_dir, store) = store().await;
        store.create("zeta", "z.wav", b"z", None, None).await.unwrap();
        store.create("alpha", "a.wav", b"a", None, None).await.unwrap();

        let voices = store.list().await.unwrap();
        assert_eq!(
            voices.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            vec!["alpha", "zeta"]
        );

        store.delete("zeta").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(matches!(
            store.get("zeta").await,
            Err(StorageError::VoiceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_voice_names_restricted() {
        let (_dir, store) = store().await;
        for bad in ["../x", "a b", "name.ext", ""] {
            assert!(store.create(bad, "r.wav", b"x", None, None).await.is_err());
        }
    }
}
