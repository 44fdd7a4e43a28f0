//! # CourseVault Store
//!
//! Where encrypted content lives, and the only way plaintext touches disk.
//!
//! ## Key Types
//!
//! - [`ArtifactStore`] - The encrypted-files directory: naming, atomic writes,
//!   reads, deletes
//! - [`DecryptedTempFile`] - Scoped plaintext copy, removed on drop
//! - [`with_decrypted_tempfile`] - Run a viewer against a scoped plaintext copy
//! - [`ContentIndex`] - The metadata collaborator interface
//! - [`MemoryIndex`] - In-memory index for tests and embedders
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use coursevault_core::{ContentCipher, KeyManager};
//! use coursevault_store::{with_decrypted_tempfile, ArtifactStore};
//!
//! let cipher = Arc::new(ContentCipher::from_manager(&KeyManager::new("secure_key.key")).unwrap());
//! let store = ArtifactStore::open("uploads/encrypted", cipher).unwrap();
//!
//! let stored = store.write("week1.pdf", b"%PDF-1.7 ...").unwrap();
//! let size = with_decrypted_tempfile(store.cipher(), &stored.path, Path::new("/tmp/cv"), |path| {
//!     // hand `path` to the renderer
//!     std::fs::metadata(path).map(|m| m.len())
//! })
//! .unwrap();
//! ```
//!
//! ## Design Notes
//!
//! - **No overwrites**: artifact names never collide; duplicates get a counter
//! - **Confined paths**: reads and deletes outside the artifact directory are refused
//! - **Plaintext discipline**: temp files are random-named, owner-only, kept out
//!   of the artifact directory, and deleted on every exit path

pub mod artifact;
pub mod error;
pub mod index;
pub mod memory;
pub mod plaintext;

pub use artifact::{artifact_file_name, sanitize_file_name, ArtifactStore, StoredArtifact};
pub use error::{Result, StoreError};
pub use index::{ContentId, ContentIndex, ContentKind, ContentRecord, NewContent};
pub use memory::MemoryIndex;
pub use plaintext::{with_decrypted_tempfile, DecryptedTempFile, TEMP_PREFIX};
