//! Engine service HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::types::{ConversionRequest, HealthResponse, SynthesisRequest};

/// Configuration for the engine client.
#[derive(Debug, Clone)]
pub struct EngineClientConfig {
    /// Base URL of the model service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
}

impl Default for EngineClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(300), // long synthesis jobs
            max_retries: 2,
        }
    }
}

impl EngineClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ENGINE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ENGINE_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("ENGINE_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the TTS/voice-conversion model service.
pub struct EngineClient {
    http: Client,
    config: EngineClientConfig,
}

impl EngineClient {
    /// Create a new engine client.
    pub fn new(config: EngineClientConfig) -> EngineResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EngineError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> EngineResult<Self> {
        Self::new(EngineClientConfig::from_env())
    }

    /// Check if the model service is healthy.
    pub async fn health_check(&self) -> EngineResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("engine health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("engine health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Synthesize speech, returning WAV bytes.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> EngineResult<Vec<u8>> {
        self.post_for_audio("synthesize", request).await
    }

    /// Convert source speech to the target voice, returning WAV bytes.
    pub async fn convert_voice(&self, request: &ConversionRequest) -> EngineResult<Vec<u8>> {
        self.post_for_audio("convert", request).await
    }

    async fn post_for_audio<B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> EngineResult<Vec<u8>> {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        debug!("sending {} request to {}", endpoint, url);

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .json(body)
                    .send()
                    .await
                    .map_err(EngineError::Network)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::RequestFailed(format!(
                "engine returned {}: {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(EngineError::InvalidResponse(
                "engine returned an empty audio body".to_string(),
            ));
        }
        Ok(bytes)
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> EngineResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = EngineResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "engine request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(EngineError::RequestFailed("Unknown error".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EngineClient {
        EngineClient::new(EngineClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .and(body_partial_json(serde_json::json!({"text": "hello"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/wav")
                    .set_body_bytes(b"RIFFdata".to_vec()),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let bytes = client
            .synthesize(&SynthesisRequest {
                text: "hello".to_string(),
                voice_path: "/voices/narrator.wav".to_string(),
                speed: None,
                seed: None,
            })
            .await
            .unwrap();
        assert_eq!(bytes, b"RIFFdata");
    }

    #[tokio::test]
    async fn test_error_body_surfaces_in_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/convert"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad reference"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .convert_voice(&ConversionRequest {
                source_path: "/tmp/in.wav".to_string(),
                voice_path: "/voices/narrator.wav".to_string(),
            })
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("bad reference"));
    }

    #[tokio::test]
    async fn test_health_check_tolerates_downtime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_audio_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .synthesize(&SynthesisRequest {
                text: "x".to_string(),
                voice_path: "v.wav".to_string(),
                speed: None,
                seed: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidResponse(_)));
    }
}
