//! In-memory implementation of the ContentIndex trait.
//!
//! Used by tests and by embedders that keep metadata elsewhere. All records
//! are lost when the index is dropped. Thread-safe via RwLock.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::index::{ContentId, ContentIndex, ContentRecord, NewContent};

/// In-memory content index.
pub struct MemoryIndex {
    inner: RwLock<MemoryIndexInner>,
}

struct MemoryIndexInner {
    next_id: u64,
    records: BTreeMap<ContentId, ContentRecord>,
}

impl MemoryIndex {
    /// Create an empty index. Ids start at 1.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryIndexInner {
                next_id: 1,
                records: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentIndex for MemoryIndex {
    fn insert(&self, content: NewContent) -> Result<ContentRecord> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = ContentId(inner.next_id);
        inner.next_id += 1;

        let record = ContentRecord {
            id,
            title: content.title,
            kind: content.kind,
            original_filename: content.original_filename,
            artifact_path: content.artifact_path,
            plaintext_len: content.plaintext_len,
            artifact_len: content.artifact_len,
            created_at: now_millis(),
        };
        inner.records.insert(id, record.clone());
        Ok(record)
    }

    fn get(&self, id: ContentId) -> Result<Option<ContentRecord>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.get(&id).cloned())
    }

    fn remove(&self, id: ContentId) -> Result<Option<ContentRecord>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.remove(&id))
    }

    fn list(&self) -> Result<Vec<ContentRecord>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.values().cloned().collect())
    }
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
