use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::snapshot::SaveTrigger;

/// Events emitted by editing sessions, consumed by the presentation layer
/// (save indicators, version-history refresh).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    SnapshotTaken(SnapshotTakenEvent),
    /// The user-visible "save failed" signal; the in-memory document is
    /// intact and the autosave controller is retrying.
    SaveFailed(SaveFailedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTakenEvent {
    pub document_id: DocumentId,
    pub version: u64,
    pub trigger: SaveTrigger,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailedEvent {
    pub document_id: DocumentId,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
