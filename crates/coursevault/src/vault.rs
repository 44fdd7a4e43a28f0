//! The vault: the content subsystem as the portal sees it.
//!
//! Construct one [`ContentVault`] at process start. Construction loads or
//! creates the content key; if that fails the vault does not exist and no
//! content request can be served.

use std::path::Path;
use std::sync::Arc;

use coursevault_core::{ContentCipher, KeyManager};
use coursevault_store::{
    with_decrypted_tempfile, ArtifactStore, ContentId, ContentIndex, ContentKind, ContentRecord,
    MemoryIndex, NewContent, StoreError,
};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::upload::{mime_for, validate_upload};

/// Decrypted content ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentData {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Encrypted content storage with metadata.
///
/// Shares one cipher across all operations; safe to use from many threads.
pub struct ContentVault<I: ContentIndex = MemoryIndex> {
    config: VaultConfig,
    store: ArtifactStore,
    index: I,
}

impl<I: ContentIndex> ContentVault<I> {
    /// Open the vault, loading or creating the content key.
    ///
    /// Key errors are fatal and returned as-is; see [`VaultError::is_fatal`].
    pub fn open(config: VaultConfig, index: I) -> Result<Self> {
        config.validate()?;

        let manager = KeyManager::new(&config.key_path);
        let cipher = ContentCipher::from_manager(&manager).map_err(|e| {
            tracing::error!(
                path = %config.key_path.display(),
                error = %e,
                "content key unavailable; content features disabled"
            );
            e
        })?;

        let store = ArtifactStore::open(&config.encrypted_dir, Arc::new(cipher))?;
        std::fs::create_dir_all(&config.temp_dir).map_err(StoreError::from)?;
        // Recheck now that both directories exist and symlinks can be resolved.
        config.check_temp_dir()?;

        tracing::info!(
            encrypted_dir = %store.dir().display(),
            temp_dir = %config.temp_dir.display(),
            "content vault ready"
        );
        Ok(Self {
            config,
            store,
            index,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The metadata index.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Validate, encrypt, store, and record an upload.
    pub fn add_content(
        &self,
        title: &str,
        kind: ContentKind,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<ContentRecord> {
        validate_upload(
            kind,
            original_filename,
            bytes.len() as u64,
            self.config.max_upload_bytes,
        )?;

        let stored = self.store.write(original_filename, bytes)?;
        let new = NewContent {
            title: title.to_string(),
            kind,
            original_filename: original_filename.to_string(),
            artifact_path: stored.path.clone(),
            plaintext_len: stored.plaintext_len,
            artifact_len: stored.artifact_len,
        };

        match self.index.insert(new) {
            Ok(record) => {
                tracing::info!(id = %record.id, title, "added content");
                Ok(record)
            }
            Err(e) => {
                // Do not leave an artifact nobody references.
                if let Err(cleanup) = self.store.remove(&stored.path) {
                    tracing::warn!(
                        path = %stored.path.display(),
                        error = %cleanup,
                        "failed to remove unindexed artifact"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Look up a content item.
    pub fn get_content(&self, id: ContentId) -> Result<ContentRecord> {
        self.index
            .get(id)?
            .ok_or(VaultError::ContentNotFound(id))
    }

    /// All content items.
    pub fn list_content(&self) -> Result<Vec<ContentRecord>> {
        Ok(self.index.list()?)
    }

    /// Decrypt a content item into memory.
    pub fn content_data(&self, id: ContentId) -> Result<ContentData> {
        let record = self.get_content(id)?;
        let bytes = self
            .store
            .read(&record.artifact_path)
            .map_err(|e| unavailable(id, e))?;
        Ok(ContentData {
            bytes,
            mime: mime_for(&record.original_filename, record.kind),
        })
    }

    /// Run `view` against a temporary plaintext copy of a content item.
    ///
    /// `view` receives the plaintext path and the MIME type. The copy is
    /// deleted when this returns, including when `view` panics.
    pub fn view_content<F, T>(&self, id: ContentId, view: F) -> Result<T>
    where
        F: FnOnce(&Path, &str) -> T,
    {
        let record = self.get_content(id)?;
        if !self.store.contains(&record.artifact_path) {
            return Err(StoreError::OutsideStore(record.artifact_path).into());
        }
        let mime = mime_for(&record.original_filename, record.kind);

        with_decrypted_tempfile(
            self.store.cipher(),
            &record.artifact_path,
            &self.config.temp_dir,
            |path| view(path, mime),
        )
        .map_err(|e| unavailable(id, e))
    }

    /// Delete a content item and its artifact together.
    ///
    /// The artifact goes first. If it cannot be removed the record stays so
    /// the item can be deleted again; an artifact already missing does not
    /// block removing the record.
    pub fn delete_content(&self, id: ContentId) -> Result<ContentRecord> {
        let record = self.get_content(id)?;

        if !self.store.remove(&record.artifact_path)? {
            tracing::warn!(
                id = %id,
                path = %record.artifact_path.display(),
                "artifact already missing; removing record"
            );
        }

        let removed = self
            .index
            .remove(id)?
            .ok_or(VaultError::ContentNotFound(id))?;
        tracing::info!(id = %id, "deleted content");
        Ok(removed)
    }
}

fn unavailable(id: ContentId, err: StoreError) -> VaultError {
    if err.is_decryption() {
        tracing::warn!(id = %id, error = %err, "content failed to decrypt");
        VaultError::ContentUnavailable {
            id,
            reason: err.to_string(),
        }
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(root: &Path) -> ContentVault {
        ContentVault::open(VaultConfig::with_root(root), MemoryIndex::new()).unwrap()
    }

    #[test]
    fn test_open_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault(dir.path());

        assert!(vault.config().key_path.is_file());
        assert!(vault.config().encrypted_dir.is_dir());
        assert!(vault.config().temp_dir.is_dir());
    }

    #[test]
    fn test_add_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault(dir.path());

        let record = vault
            .add_content("Week 1", ContentKind::Pdf, "week1.pdf", b"%PDF week one")
            .unwrap();

        assert_eq!(record.plaintext_len, 13);
        assert!(vault.store().contains(&record.artifact_path));

        let data = vault.content_data(record.id).unwrap();
        assert_eq!(data.bytes, b"%PDF week one");
        assert_eq!(data.mime, "application/pdf");
    }

    #[test]
    fn test_rejected_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault(dir.path());

        let err = vault
            .add_content("Clip", ContentKind::Video, "clip.exe", b"MZ")
            .unwrap_err();

        assert!(matches!(err, VaultError::Validation(_)));
        assert_eq!(std::fs::read_dir(vault.store().dir()).unwrap().count(), 0);
        assert!(vault.list_content().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault(dir.path());

        assert!(matches!(
            vault.content_data(ContentId(42)),
            Err(VaultError::ContentNotFound(ContentId(42)))
        ));
        assert!(matches!(
            vault.delete_content(ContentId(42)),
            Err(VaultError::ContentNotFound(_))
        ));
    }
}
