//! Error types for the store module.

use std::path::PathBuf;

use coursevault_core::CoreError;
use thiserror::Error;

use crate::index::ContentId;

/// Errors that can occur during artifact and index operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key or cipher error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No record with this id.
    #[error("content not found: {0}")]
    NotFound(ContentId),

    /// Path does not belong to the artifact directory.
    #[error("path is outside the artifact directory: {}", .0.display())]
    OutsideStore(PathBuf),

    /// Plaintext temp directory would expose plaintext next to artifacts.
    #[error("invalid plaintext directory: {}", .0.display())]
    InvalidTempDir(PathBuf),

    /// Could not find a free artifact name.
    #[error("artifact name collision for {0}")]
    NameExhausted(String),
}

impl StoreError {
    /// True when the underlying failure is an authentication/integrity failure.
    pub fn is_decryption(&self) -> bool {
        matches!(self, StoreError::Core(e) if e.is_decryption())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
