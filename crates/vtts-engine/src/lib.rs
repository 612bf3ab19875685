//! Client for the TTS/voice-conversion model service.
//!
//! The model runs as a separate process behind a small HTTP interface:
//! synthesis and conversion requests go out as JSON, audio comes back as
//! WAV bytes. Transient failures are retried with exponential backoff.

pub mod client;
pub mod error;
pub mod types;

pub use client::{EngineClient, EngineClientConfig};
pub use error::{EngineError, EngineResult};
pub use types::{ConversionRequest, HealthResponse, SynthesisRequest};
