use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::Block;

/// Opaque document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Published,
}

/// Top-level document metadata, editable independently of the block list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub title: String,
    pub slug: String,
    pub status: DocumentStatus,
    pub excerpt: String,
    pub category: String,
    pub featured: bool,
}

impl DocumentMeta {
    pub fn draft(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            status: DocumentStatus::Draft,
            excerpt: String::new(),
            category: String::new(),
            featured: false,
        }
    }
}

/// The live editable unit: metadata plus blocks ordered by position key.
///
/// `blocks` is kept sorted by `position` at all times; the operations in
/// [`crate::document::ops`] are the only mutation path and preserve that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub blocks: Vec<Block>,
    /// Version of the last snapshot taken from this live state; 0 before the
    /// first snapshot.
    pub current_version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; snapshots may still reference a deleted document.
    pub deleted: bool,
}

impl Document {
    pub fn new(meta: DocumentMeta) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            meta,
            blocks: Vec::new(),
            current_version: 0,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }
}
