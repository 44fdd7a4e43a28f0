//! Error types for the core module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during key management and content encryption.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The key file could not be read or written.
    ///
    /// Fatal: the content subsystem cannot serve any request without a key.
    #[error("key storage error at {}: {source}", .path.display())]
    KeyStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file exists but does not hold a 256-bit key.
    #[error("invalid key file at {}: expected 32 bytes, found {len}", .path.display())]
    InvalidKeyFile { path: PathBuf, len: usize },

    /// Encryption failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Authentication failed, or the blob is truncated or of an unknown format.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Plaintext destination is not allowed (e.g. inside the artifact directory).
    #[error("refusing to write plaintext to {}", .0.display())]
    InvalidOutput(PathBuf),

    /// I/O error while reading or writing artifact files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True for authentication/integrity failures.
    pub fn is_decryption(&self) -> bool {
        matches!(self, CoreError::Decryption(_))
    }

    /// True for errors that must abort initialization of the content subsystem.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::KeyStorage { .. } | CoreError::InvalidKeyFile { .. }
        )
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
