use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::document::{DocumentId, DocumentMeta};

/// What caused a snapshot to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveTrigger {
    ManualSave,
    Autosave,
    Restore,
}

/// Immutable point-in-time copy of a document.
///
/// Append-only: once written, only the human label may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub document_id: DocumentId,
    /// Monotonic per document, starting at 1, no gaps.
    pub version: u64,
    pub meta: DocumentMeta,
    pub blocks: Vec<Block>,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub trigger: SaveTrigger,
}

impl Snapshot {
    pub fn header(&self) -> SnapshotHeader {
        SnapshotHeader {
            document_id: self.document_id,
            version: self.version,
            label: self.label.clone(),
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            trigger: self.trigger,
        }
    }
}

/// Listing row for the version-history panel; omits the block payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHeader {
    pub document_id: DocumentId,
    pub version: u64,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub trigger: SaveTrigger,
}
