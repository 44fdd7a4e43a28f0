//! # CourseVault Testkit
//!
//! Testing utilities for CourseVault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A vault rooted in a throwaway directory, with helpers to
//!   upload, restart, and corrupt content
//! - **Generators**: Proptest strategies for plaintext, upload names, and
//!   hostile client-supplied filenames
//!
//! ## Test Fixtures
//!
//! ```rust
//! use coursevault_testkit::fixtures::TestVault;
//!
//! let fixture = TestVault::new();
//! let record = fixture.add_pdf("week1.pdf", b"%PDF-1.7 ...");
//! assert_eq!(fixture.vault.content_data(record.id).unwrap().bytes, b"%PDF-1.7 ...");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use coursevault_testkit::generators::UploadParams;
//! use coursevault_testkit::fixtures::TestVault;
//!
//! proptest! {
//!     #[test]
//!     fn upload_roundtrips(params: UploadParams) {
//!         let fixture = TestVault::new();
//!         let record = fixture.vault
//!             .add_content("t", params.kind, &params.filename, &params.bytes)
//!             .unwrap();
//!         prop_assert_eq!(fixture.vault.content_data(record.id).unwrap().bytes, params.bytes);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{flip_bit, TestVault};
pub use generators::{content_kind, hostile_filename, plaintext, upload_filename, UploadParams};
