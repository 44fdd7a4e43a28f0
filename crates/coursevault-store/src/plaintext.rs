//! Scoped plaintext files for viewers that need a filesystem path.
//!
//! Decrypted content only reaches disk through [`DecryptedTempFile`]. The
//! file gets a random name in a directory outside the artifact directory,
//! is readable only by the owner, and is deleted when the guard drops,
//! including during panic unwinding.

use std::io::Write;
use std::path::{Path, PathBuf};

use coursevault_core::{fs, ContentCipher, ARTIFACT_EXTENSION};
use tempfile::TempPath;
use zeroize::Zeroizing;

use crate::error::{Result, StoreError};

/// Prefix of every plaintext temp file.
pub const TEMP_PREFIX: &str = "cv-view-";

/// A decrypted copy of an artifact that is removed on drop.
#[derive(Debug)]
pub struct DecryptedTempFile {
    path: PathBuf,
    // Taken only in `Drop`, where closing it explicitly lets a failed removal be logged.
    guard: Option<TempPath>,
}

impl DecryptedTempFile {
    /// Decrypt `artifact_path` into a fresh file inside `temp_dir`.
    ///
    /// Nothing is written if decryption fails. `temp_dir` is created if
    /// missing and must not resolve to the artifact's directory or anywhere
    /// beneath it.
    pub fn create(cipher: &ContentCipher, artifact_path: &Path, temp_dir: &Path) -> Result<Self> {
        if fs::is_within(temp_dir, fs::parent_dir(artifact_path))? {
            return Err(StoreError::InvalidTempDir(temp_dir.to_path_buf()));
        }

        let plaintext = Zeroizing::new(cipher.decrypt_file(artifact_path)?);
        std::fs::create_dir_all(temp_dir)?;

        let suffix = plaintext_suffix(artifact_path);
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile_in(temp_dir)?;
        fs::restrict_permissions(file.as_file())?;
        file.write_all(&plaintext)?;
        file.flush()?;

        let path = file.into_temp_path();
        tracing::debug!(
            artifact = %artifact_path.display(),
            path = %path.display(),
            "materialised plaintext"
        );
        Ok(Self {
            path: path.to_path_buf(),
            guard: Some(path),
        })
    }

    /// Path of the plaintext file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DecryptedTempFile {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            match guard.close() {
                Ok(()) => tracing::debug!(path = %self.path.display(), "removed plaintext"),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove plaintext temp file"
                ),
            }
        }
    }
}

/// Run `f` with a plaintext copy of `artifact_path`, deleting it afterwards.
///
/// The file is removed whether `f` returns normally or panics.
pub fn with_decrypted_tempfile<F, T>(
    cipher: &ContentCipher,
    artifact_path: &Path,
    temp_dir: &Path,
    f: F,
) -> Result<T>
where
    F: FnOnce(&Path) -> T,
{
    let guard = DecryptedTempFile::create(cipher, artifact_path, temp_dir)?;
    Ok(f(guard.path()))
}

// "lecture-1a2b3c4d.pdf.enc" -> ".pdf"
fn plaintext_suffix(artifact_path: &Path) -> String {
    let inner: PathBuf = match artifact_path.extension() {
        Some(ext) if ext == ARTIFACT_EXTENSION => artifact_path.with_extension(""),
        _ => artifact_path.to_path_buf(),
    };
    inner
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}
