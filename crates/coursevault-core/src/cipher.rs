//! Authenticated encryption of whole content files.
//!
//! Every blob is self-contained:
//!
//! ```text
//! version (1) || nonce (24) || ciphertext || tag (16)
//! ```
//!
//! The version byte is authenticated as associated data. Nonces are drawn
//! at random per call; the 192-bit XChaCha20 nonce makes random nonces safe
//! under the one long-lived key.
//!
//! Files are read fully into memory. Callers bound this through the upload
//! size limit; arbitrarily large inputs are not supported.

use std::path::{Path, PathBuf};

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{CoreError, Result};
use crate::fs;
use crate::key::{ContentKey, KeyManager};

/// Format byte for XChaCha20-Poly1305 blobs.
pub const FORMAT_V1: u8 = 0x01;

/// XChaCha20 nonce length.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;

/// Fixed size difference between a blob and its plaintext.
pub const BLOB_OVERHEAD: usize = 1 + NONCE_LEN + TAG_LEN;

/// File extension marking encrypted artifacts.
pub const ARTIFACT_EXTENSION: &str = "enc";

/// Encrypts and decrypts content under the managed key.
///
/// Stateless apart from the key; safe to share across threads.
#[derive(Debug, Clone)]
pub struct ContentCipher {
    key: ContentKey,
}

impl ContentCipher {
    /// Create a cipher for `key`.
    pub fn new(key: ContentKey) -> Self {
        Self { key }
    }

    /// Load or create the key through `manager` and wrap it.
    pub fn from_manager(manager: &KeyManager) -> Result<Self> {
        manager.get_or_create_key().map(Self::new)
    }

    /// The key this cipher encrypts under.
    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    fn aead(&self) -> Result<XChaCha20Poly1305> {
        XChaCha20Poly1305::new_from_slice(self.key.as_bytes())
            .map_err(|e| CoreError::Encryption(e.to_string()))
    }

    /// Encrypt `plaintext` into a self-contained blob.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .aead()?
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &[FORMAT_V1],
                },
            )
            .map_err(|e| CoreError::Encryption(e.to_string()))?;

        let mut blob = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        blob.push(FORMAT_V1);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails with [`CoreError::Decryption`] if the blob was truncated,
    /// modified, or produced under another key.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < BLOB_OVERHEAD {
            return Err(CoreError::Decryption(format!(
                "blob too short: {} bytes",
                blob.len()
            )));
        }

        let version = blob[0];
        if version != FORMAT_V1 {
            return Err(CoreError::Decryption(format!(
                "unsupported format version {:#04x}",
                version
            )));
        }

        let (nonce, ciphertext) = blob[1..].split_at(NONCE_LEN);
        self.aead()
            .map_err(|e| CoreError::Decryption(e.to_string()))?
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &[version],
                },
            )
            .map_err(|_| CoreError::Decryption("authentication failed".into()))
    }

    /// Encrypt the file at `input_path` into `output_dir`.
    ///
    /// The artifact is named after the input file with an `.enc` suffix.
    /// `output_dir` is created if missing. Returns the artifact path.
    pub fn encrypt_file(&self, input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let name = input_path.file_name().ok_or_else(|| {
            CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no file name in {}", input_path.display()),
            ))
        })?;

        std::fs::create_dir_all(output_dir)?;
        let mut artifact_name = name.to_os_string();
        artifact_name.push(".");
        artifact_name.push(ARTIFACT_EXTENSION);
        let output_path = output_dir.join(artifact_name);

        let plaintext = std::fs::read(input_path)?;
        let blob = self.encrypt(&plaintext)?;
        fs::write_atomic(&output_path, &blob, false)?;

        tracing::debug!(
            input = %input_path.display(),
            output = %output_path.display(),
            bytes = plaintext.len(),
            "encrypted file"
        );
        Ok(output_path)
    }

    /// Decrypt the artifact at `input_path` into memory.
    pub fn decrypt_file(&self, input_path: &Path) -> Result<Vec<u8>> {
        let blob = std::fs::read(input_path)?;
        self.decrypt(&blob).map_err(|e| {
            tracing::warn!(path = %input_path.display(), error = %e, "artifact failed to decrypt");
            e
        })
    }

    /// Decrypt the artifact at `input_path` and write the plaintext to `output_path`.
    ///
    /// The plaintext file is owner-only. Writing plaintext anywhere under the
    /// directory that holds the artifact is refused with
    /// [`CoreError::InvalidOutput`] before any directory is created.
    pub fn decrypt_file_to(&self, input_path: &Path, output_path: &Path) -> Result<PathBuf> {
        let output_dir = fs::parent_dir(output_path);
        if fs::is_within(output_dir, fs::parent_dir(input_path))? {
            return Err(CoreError::InvalidOutput(output_path.to_path_buf()));
        }

        let plaintext = Zeroizing::new(self.decrypt_file(input_path)?);
        std::fs::create_dir_all(output_dir)?;
        fs::write_atomic(output_path, &plaintext, true)?;
        Ok(output_path.to_path_buf())
    }
}
