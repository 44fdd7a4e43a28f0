//! The encrypted artifact directory.
//!
//! One artifact per content item, named after the sanitised original
//! filename plus a short content tag:
//!
//! ```text
//! <stem>-<tag8>.<ext>.enc
//! ```
//!
//! The tag is a BLAKE3 keyed hash under a subkey of the content key, so a
//! directory listing does not reveal whether a known file was uploaded.
//!
//! Artifacts are never overwritten. If the name is taken (same file uploaded
//! twice) a counter is appended, so deleting one content item can never
//! remove another item's artifact.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use coursevault_core::{fs, ContentCipher, ContentKey, ARTIFACT_EXTENSION};
use zeroize::Zeroizing;

use crate::error::{Result, StoreError};

/// Upper bound on collision suffixes tried for one upload.
const MAX_NAME_ATTEMPTS: u32 = 64;

/// Fallback stem for names with nothing usable in them.
const DEFAULT_STEM: &str = "content";

/// BLAKE3 key-derivation context for the naming subkey.
const NAME_TAG_CONTEXT: &str = "coursevault 2024-01-01 artifact name tag v1";

/// Result of storing an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub plaintext_len: u64,
    pub artifact_len: u64,
}

/// Encrypted content directory backed by a shared [`ContentCipher`].
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    cipher: Arc<ContentCipher>,
}

impl ArtifactStore {
    /// Open the artifact directory, creating it if missing.
    pub fn open(dir: impl AsRef<Path>, cipher: Arc<ContentCipher>) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let dir = dir.as_ref().canonicalize()?;
        Ok(Self { dir, cipher })
    }

    /// The canonical artifact directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The cipher artifacts are encrypted with.
    pub fn cipher(&self) -> &ContentCipher {
        &self.cipher
    }

    /// Encrypt `plaintext` and store it under a name derived from `original_name`.
    pub fn write(&self, original_name: &str, plaintext: &[u8]) -> Result<StoredArtifact> {
        let blob = self.cipher.encrypt(plaintext)?;

        let (stem, ext) = split_name(&sanitize_file_name(original_name));
        let tag = name_tag(self.cipher.key(), plaintext);

        let mut staged = tempfile::Builder::new()
            .prefix(".cv-")
            .tempfile_in(&self.dir)?;
        staged.write_all(&blob)?;
        staged.as_file().sync_all()?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self
                .dir
                .join(candidate_name(&stem, ext.as_deref(), &tag, attempt));
            match staged.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::info!(
                        path = %path.display(),
                        plaintext_len = plaintext.len(),
                        artifact_len = blob.len(),
                        "stored encrypted artifact"
                    );
                    return Ok(StoredArtifact {
                        path,
                        plaintext_len: plaintext.len() as u64,
                        artifact_len: blob.len() as u64,
                    });
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => staged = e.file,
                Err(e) => return Err(e.error.into()),
            }
        }

        Err(StoreError::NameExhausted(original_name.to_string()))
    }

    /// Read and decrypt the artifact at `path`.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = self.resolve(path)?;
        Ok(self.cipher.decrypt_file(&path)?)
    }

    /// Delete the artifact at `path`. Returns false if it was already gone.
    pub fn remove(&self, path: &Path) -> Result<bool> {
        let path = self.resolve(path)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed encrypted artifact");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `path` names a file directly inside the artifact directory.
    pub fn contains(&self, path: &Path) -> bool {
        self.resolve(path).is_ok()
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let outside = || StoreError::OutsideStore(path.to_path_buf());
        let name = path.file_name().ok_or_else(outside)?;
        let parent = fs::parent_dir(path).canonicalize().map_err(|_| outside())?;
        if parent != self.dir {
            return Err(outside());
        }
        Ok(self.dir.join(name))
    }
}

/// Reduce an uploaded filename to a safe single path component.
///
/// Directory parts are dropped, characters outside `[A-Za-z0-9._-]` become
/// `_`, and leading dots are stripped so the result is never hidden or `..`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The artifact file name for a first upload of `plaintext` as `original_name`
/// under `key`.
pub fn artifact_file_name(key: &ContentKey, original_name: &str, plaintext: &[u8]) -> String {
    let (stem, ext) = split_name(&sanitize_file_name(original_name));
    candidate_name(&stem, ext.as_deref(), &name_tag(key, plaintext), 0)
}

fn split_name(name: &str) -> (String, Option<String>) {
    match name.rfind('.') {
        Some(i) if i > 0 && i + 1 < name.len() => {
            (name[..i].to_string(), Some(name[i + 1..].to_string()))
        }
        _ => (name.trim_end_matches('.').to_string(), None),
    }
}

fn name_tag(key: &ContentKey, plaintext: &[u8]) -> String {
    let subkey = Zeroizing::new(blake3::derive_key(NAME_TAG_CONTEXT, key.as_bytes()));
    hex::encode(&blake3::keyed_hash(&subkey, plaintext).as_bytes()[..4])
}

fn candidate_name(stem: &str, ext: Option<&str>, tag: &str, attempt: u32) -> String {
    let mut name = format!("{}-{}", stem, tag);
    if attempt > 0 {
        name.push_str(&format!("-{}", attempt));
    }
    if let Some(ext) = ext {
        name.push('.');
        name.push_str(ext);
    }
    name.push('.');
    name.push_str(ARTIFACT_EXTENSION);
    name
}
