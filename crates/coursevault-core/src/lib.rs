//! # CourseVault Core
//!
//! At-rest encryption for uploaded course content.
//!
//! ## Overview
//!
//! Two pieces make up the core:
//!
//! - [`KeyManager`] owns the single 256-bit content key. The key is generated
//!   from the OS random source on first start and persisted to an owner-only
//!   key file; every later start reads it back unchanged.
//! - [`ContentCipher`] wraps the key and encrypts whole files with
//!   XChaCha20-Poly1305 into self-contained blobs.
//!
//! ## Key Concepts
//!
//! - **One key, no rotation**: deleting the key file makes every existing
//!   artifact permanently unreadable.
//! - **Authenticated**: any modification of a blob, or decrypting under
//!   another key, fails with [`CoreError::Decryption`] instead of returning
//!   wrong plaintext.
//! - **Fatal key errors**: [`CoreError::is_fatal`] errors mean the content
//!   subsystem must not start.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use coursevault_core::{ContentCipher, KeyManager};
//!
//! let manager = KeyManager::new("secure_key.key");
//! let cipher = ContentCipher::from_manager(&manager).unwrap();
//!
//! let blob = cipher.encrypt(b"hello world").unwrap();
//! assert_eq!(cipher.decrypt(&blob).unwrap(), b"hello world");
//! ```

pub mod cipher;
pub mod error;
pub mod fs;
pub mod key;

pub use cipher::{ContentCipher, ARTIFACT_EXTENSION, BLOB_OVERHEAD, FORMAT_V1, NONCE_LEN, TAG_LEN};
pub use error::{CoreError, Result};
pub use key::{ContentKey, KeyManager, KEY_LEN};
