//! ContentIndex trait: the metadata collaborator.
//!
//! The portal keeps content metadata in its own database. This trait is the
//! narrow interface the vault needs from it; [`MemoryIndex`](crate::MemoryIndex)
//! implements it in process.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier of a content item, assigned by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub u64);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of uploaded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Pdf,
    Video,
}

impl ContentKind {
    /// MIME type used when the original filename does not determine one.
    pub fn fallback_mime(&self) -> &'static str {
        match self {
            ContentKind::Pdf => "application/pdf",
            ContentKind::Video => "video/mp4",
        }
    }
}

/// A content item about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub title: String,
    pub kind: ContentKind,
    pub original_filename: String,
    pub artifact_path: PathBuf,
    pub plaintext_len: u64,
    pub artifact_len: u64,
}

/// A recorded content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub title: String,
    pub kind: ContentKind,
    pub original_filename: String,
    /// Location of the encrypted artifact.
    pub artifact_path: PathBuf,
    pub plaintext_len: u64,
    pub artifact_len: u64,
    /// Unix ms.
    pub created_at: i64,
}

/// Metadata persistence for content items.
pub trait ContentIndex: Send + Sync {
    /// Record a new content item and assign its id.
    fn insert(&self, content: NewContent) -> Result<ContentRecord>;

    /// Look up a content item.
    fn get(&self, id: ContentId) -> Result<Option<ContentRecord>>;

    /// Remove a content item, returning the removed record.
    fn remove(&self, id: ContentId) -> Result<Option<ContentRecord>>;

    /// All content items, ordered by id.
    fn list(&self) -> Result<Vec<ContentRecord>>;
}
