//! # CourseVault
//!
//! Encrypted storage for course content: uploads are encrypted before they
//! touch disk, decrypted only for the duration of a view, and deleted
//! together with their metadata.
//!
//! ## Overview
//!
//! - **Key**: one 256-bit key, created on first start, stored in an
//!   owner-only key file outside the database
//! - **Artifacts**: one XChaCha20-Poly1305 blob per content item in the
//!   encrypted directory
//! - **Viewing**: plaintext in memory, or in a scoped temp file that is
//!   removed on every exit path
//! - **Screenshots**: a per-user, per-item limit while viewing protected
//!   content
//!
//! ## Usage
//!
//! ```rust,no_run
//! use coursevault::{ContentVault, VaultConfig, MemoryIndex, ContentKind};
//!
//! let vault = ContentVault::open(VaultConfig::default(), MemoryIndex::new())
//!     .expect("content key unavailable");
//!
//! let record = vault
//!     .add_content("Week 1", ContentKind::Pdf, "week1.pdf", b"%PDF-1.7 ...")
//!     .unwrap();
//!
//! let (viewed, mime) = vault
//!     .view_content(record.id, |path, mime| {
//!         // hand `path` to the renderer
//!         (path.to_path_buf(), mime.to_string())
//!     })
//!     .unwrap();
//!
//! vault.delete_content(record.id).unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `coursevault::core` - Key management and the content cipher
//! - `coursevault::store` - Artifact directory, plaintext temp files, index

pub mod config;
pub mod error;
pub mod throttle;
pub mod upload;
pub mod vault;

// Re-export component crates
pub use coursevault_core as core;
pub use coursevault_store as store;

// Re-export main types for convenience
pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use throttle::{MemoryScreenshotLog, ScreenshotDecision, ScreenshotLog, ScreenshotPolicy, UserId};
pub use vault::{ContentData, ContentVault};

pub use coursevault_core::{ContentCipher, ContentKey, CoreError, KeyManager};
pub use coursevault_store::{
    ContentId, ContentIndex, ContentKind, ContentRecord, DecryptedTempFile, MemoryIndex,
    StoreError,
};
