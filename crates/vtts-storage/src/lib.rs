//! Filesystem stores backing the API.
//!
//! This crate provides:
//! - Output file store with traversal-safe resolution and paginated listing
//! - Voice reference store with JSON metadata sidecars
//! - Stale upload directory sweeping

pub mod error;
pub mod outputs;
pub mod voices;

pub use error::{StorageError, StorageResult};
pub use outputs::{cleanup_stale_uploads, OutputStore, StoredFile, StoredPage};
pub use voices::VoiceStore;
