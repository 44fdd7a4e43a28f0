//! The content key and its on-disk lifecycle.
//!
//! A single 256-bit key protects every artifact. It is generated from the OS
//! random source the first time the portal starts and read back unchanged on
//! every later start. There is no rotation: losing the key file makes all
//! existing artifacts unrecoverable.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CoreError, Result};
use crate::fs;

/// Length of the content key in bytes.
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key for XChaCha20-Poly1305.
///
/// The bytes are wiped when the key is dropped.
#[derive(Clone)]
pub struct ContentKey([u8; KEY_LEN]);

impl ContentKey {
    /// Generate a new key from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl PartialEq for ContentKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl Eq for ContentKey {}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(<redacted>)")
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Loads the content key from its key file, creating it on first use.
///
/// Construct one at process start and hand the resulting cipher to every
/// caller; the key file is not meant to be re-read per request.
#[derive(Debug, Clone)]
pub struct KeyManager {
    path: PathBuf,
}

impl KeyManager {
    /// Create a manager for the key file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured key file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the persisted key, generating and persisting one if none exists.
    ///
    /// When several processes race on a missing key file exactly one key is
    /// persisted, and every caller returns that key.
    pub fn get_or_create_key(&self) -> Result<ContentKey> {
        match self.load()? {
            Some(key) => Ok(key),
            None => self.create(),
        }
    }

    fn load(&self) -> Result<Option<ContentKey>> {
        let mut bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error(e)),
        };

        if bytes.len() != KEY_LEN {
            let len = bytes.len();
            bytes.zeroize();
            return Err(CoreError::InvalidKeyFile {
                path: self.path.clone(),
                len,
            });
        }

        match fs::is_group_or_world_accessible(&self.path) {
            Ok(true) => tracing::warn!(
                path = %self.path.display(),
                "key file is readable by group or other; restrict it to the owner"
            ),
            Ok(false) => {}
            Err(e) => return Err(self.storage_error(e)),
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();

        tracing::debug!(path = %self.path.display(), "loaded content key");
        Ok(Some(ContentKey(key)))
    }

    fn create(&self) -> Result<ContentKey> {
        let dir = fs::parent_dir(&self.path);
        if !dir.is_dir() {
            return Err(self.storage_error(io::Error::new(
                io::ErrorKind::NotFound,
                format!("key directory {} does not exist", dir.display()),
            )));
        }

        let key = ContentKey::generate();

        // Stage the key next to its final location, then link it into place
        // without replacing anything. The key file is either absent or whole.
        let mut staged = tempfile::Builder::new()
            .prefix(".key-")
            .tempfile_in(dir)
            .map_err(|e| self.storage_error(e))?;
        fs::restrict_permissions(staged.as_file()).map_err(|e| self.storage_error(e))?;
        staged
            .write_all(key.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| self.storage_error(e))?;

        match staged.persist_noclobber(&self.path) {
            Ok(_) => {
                tracing::info!(path = %self.path.display(), "created new content key");
                Ok(key)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(
                    path = %self.path.display(),
                    "key file created concurrently; using the persisted key"
                );
                self.load()?.ok_or_else(|| {
                    self.storage_error(io::Error::new(
                        io::ErrorKind::NotFound,
                        "key file vanished after concurrent creation",
                    ))
                })
            }
            Err(e) => Err(self.storage_error(e.error)),
        }
    }

    fn storage_error(&self, source: io::Error) -> CoreError {
        CoreError::KeyStorage {
            path: self.path.clone(),
            source,
        }
    }
}
