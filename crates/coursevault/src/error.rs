//! Error types for the vault.

use coursevault_core::CoreError;
use coursevault_store::{ContentId, StoreError};
use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Key or cipher error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Artifact or index error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Upload rejected.
    #[error("invalid upload: {0}")]
    Validation(String),

    /// No content with this id.
    #[error("content not found: {0}")]
    ContentNotFound(ContentId),

    /// The artifact exists but failed authentication.
    ///
    /// Viewers show "file not available" and keep serving other content.
    #[error("content {id} is unavailable: {reason}")]
    ContentUnavailable { id: ContentId, reason: String },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VaultError {
    /// True for errors that must stop the content subsystem from starting.
    pub fn is_fatal(&self) -> bool {
        match self {
            VaultError::Core(e) => e.is_fatal(),
            VaultError::Store(StoreError::Core(e)) => e.is_fatal(),
            VaultError::Config(_) => true,
            _ => false,
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
