//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::PathBuf;

use coursevault::{ContentKind, ContentRecord, ContentVault, MemoryIndex, VaultConfig};
use tempfile::TempDir;

/// A vault rooted in its own temporary directory.
///
/// The directory (key file, artifacts, temp files) is removed on drop.
pub struct TestVault {
    pub dir: TempDir,
    pub vault: ContentVault,
}

impl TestVault {
    /// Create a vault with a fresh key.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let vault = ContentVault::open(VaultConfig::with_root(dir.path()), MemoryIndex::new())
            .expect("open vault");
        Self { dir, vault }
    }

    /// The configuration the vault was opened with.
    pub fn config(&self) -> VaultConfig {
        VaultConfig::with_root(self.dir.path())
    }

    /// Open a second vault on the same directory, as a restarted process would.
    ///
    /// The new vault shares the key file but starts with an empty index.
    pub fn reopen(&self) -> ContentVault {
        ContentVault::open(self.config(), MemoryIndex::new()).expect("reopen vault")
    }

    /// Upload a PDF.
    pub fn add_pdf(&self, filename: &str, bytes: &[u8]) -> ContentRecord {
        self.vault
            .add_content(filename, ContentKind::Pdf, filename, bytes)
            .expect("add pdf")
    }

    /// Upload a video.
    pub fn add_video(&self, filename: &str, bytes: &[u8]) -> ContentRecord {
        self.vault
            .add_content(filename, ContentKind::Video, filename, bytes)
            .expect("add video")
    }

    /// Flip one bit of a stored artifact on disk.
    pub fn corrupt_artifact(&self, record: &ContentRecord, bit: usize) {
        let mut blob = std::fs::read(&record.artifact_path).expect("read artifact");
        flip_bit(&mut blob, bit);
        std::fs::write(&record.artifact_path, &blob).expect("write artifact");
    }

    /// Files currently present in the plaintext temp directory.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.config().temp_dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}

/// Flip bit `bit` (wrapping around the buffer length) of `bytes`.
pub fn flip_bit(bytes: &mut [u8], bit: usize) {
    if bytes.is_empty() {
        return;
    }
    let bit = bit % (bytes.len() * 8);
    bytes[bit / 8] ^= 1 << (bit % 8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursevault::VaultError;

    #[test]
    fn test_flip_bit_wraps() {
        let mut bytes = [0u8; 2];
        flip_bit(&mut bytes, 17);
        assert_eq!(bytes, [0b10, 0]);
    }

    #[test]
    fn test_reopen_shares_key() {
        let fixture = TestVault::new();
        let record = fixture.add_pdf("week1.pdf", b"%PDF one");

        let reopened = fixture.reopen();

        assert_eq!(
            reopened.store().read(&record.artifact_path).unwrap(),
            b"%PDF one"
        );
    }

    #[test]
    fn test_corrupt_artifact() {
        let fixture = TestVault::new();
        let record = fixture.add_video("intro.mp4", b"frames");

        fixture.corrupt_artifact(&record, 200);

        assert!(matches!(
            fixture.vault.content_data(record.id),
            Err(VaultError::ContentUnavailable { .. })
        ));
        assert!(fixture.temp_files().is_empty());
    }
}
