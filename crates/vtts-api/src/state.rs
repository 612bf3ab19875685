//! Application state.

use std::path::PathBuf;
use std::sync::Arc;

use vtts_audio::{AudioError, AudioResult, SourceResolver};
use vtts_engine::EngineClient;
use vtts_storage::{OutputStore, VoiceStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub outputs: Arc<OutputStore>,
    pub voices: Arc<VoiceStore>,
    pub engine: Arc<EngineClient>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let outputs = OutputStore::open(&config.outputs_dir).await?;
        let voices = VoiceStore::open(&config.voices_dir).await?;
        let engine = EngineClient::from_env()?;

        Ok(Self {
            config,
            outputs: Arc::new(outputs),
            voices: Arc::new(voices),
            engine: Arc::new(engine),
        })
    }

    /// Resolver handed to the audio pipeline for server-file segments.
    pub fn resolver(&self) -> StoreResolver {
        StoreResolver {
            outputs: Arc::clone(&self.outputs),
        }
    }
}

/// Maps server-file references onto the outputs store.
pub struct StoreResolver {
    outputs: Arc<OutputStore>,
}

impl SourceResolver for StoreResolver {
    fn resolve(&self, name: &str) -> AudioResult<PathBuf> {
        self.outputs
            .resolve(name)
            .map_err(|_| AudioError::FileNotFound(PathBuf::from(name)))
    }
}
