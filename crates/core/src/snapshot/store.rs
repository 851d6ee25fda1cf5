//! Append-only snapshot storage.
//!
//! Persistence itself is a collaborator concern, abstracted behind
//! [`SnapshotBackend`]; the bundled [`MemoryBackend`] is the single-node
//! implementation. [`SnapshotStore`] layers the version-assignment protocol
//! on top and serializes `take` per document so concurrent save triggers can
//! never be handed the same version number.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::document::{Document, DocumentId};
use crate::error::{CoreError, CoreResult};
use crate::snapshot::types::{SaveTrigger, Snapshot, SnapshotHeader};

/// Storage collaborator for snapshot records. Single-record operations are
/// atomic; anything transiently broken maps to `StoreUnavailable`.
pub trait SnapshotBackend: Send + Sync + 'static {
    fn append(&self, snapshot: Snapshot) -> CoreResult<()>;
    /// Highest version stored for the document, 0 when none.
    fn head_version(&self, document_id: DocumentId) -> CoreResult<u64>;
    fn list(&self, document_id: DocumentId) -> CoreResult<Vec<SnapshotHeader>>;
    fn get(&self, document_id: DocumentId, version: u64) -> CoreResult<Snapshot>;
    fn set_label(&self, document_id: DocumentId, version: u64, label: String) -> CoreResult<()>;
}

/// In-memory backend. `set_available(false)` simulates a storage outage,
/// which is how the autosave retry path is exercised.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    streams: StdMutex<HashMap<DocumentId, Vec<Snapshot>>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> CoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CoreError::StoreUnavailable("memory backend offline".into()))
        } else {
            Ok(())
        }
    }

    fn streams(&self) -> CoreResult<std::sync::MutexGuard<'_, HashMap<DocumentId, Vec<Snapshot>>>> {
        self.streams
            .lock()
            .map_err(|_| CoreError::StoreUnavailable("backend state poisoned".into()))
    }
}

impl SnapshotBackend for MemoryBackend {
    fn append(&self, snapshot: Snapshot) -> CoreResult<()> {
        self.check_available()?;
        let mut streams = self.streams()?;
        streams.entry(snapshot.document_id).or_default().push(snapshot);
        Ok(())
    }

    fn head_version(&self, document_id: DocumentId) -> CoreResult<u64> {
        self.check_available()?;
        let streams = self.streams()?;
        Ok(streams
            .get(&document_id)
            .and_then(|s| s.last())
            .map(|s| s.version)
            .unwrap_or(0))
    }

    fn list(&self, document_id: DocumentId) -> CoreResult<Vec<SnapshotHeader>> {
        self.check_available()?;
        let streams = self.streams()?;
        let mut headers: Vec<_> = streams
            .get(&document_id)
            .map(|s| s.iter().map(Snapshot::header).collect())
            .unwrap_or_default();
        headers.sort_by(|a: &SnapshotHeader, b: &SnapshotHeader| b.version.cmp(&a.version));
        Ok(headers)
    }

    fn get(&self, document_id: DocumentId, version: u64) -> CoreResult<Snapshot> {
        self.check_available()?;
        let streams = self.streams()?;
        streams
            .get(&document_id)
            .and_then(|s| s.iter().find(|s| s.version == version))
            .cloned()
            .ok_or(CoreError::NotFound {
                document_id,
                version,
            })
    }

    fn set_label(&self, document_id: DocumentId, version: u64, label: String) -> CoreResult<()> {
        self.check_available()?;
        let mut streams = self.streams()?;
        let snapshot = streams
            .get_mut(&document_id)
            .and_then(|s| s.iter_mut().find(|s| s.version == version))
            .ok_or(CoreError::NotFound {
                document_id,
                version,
            })?;
        snapshot.label = Some(label);
        Ok(())
    }
}

/// Versioned snapshot store fronting a backend.
#[derive(Clone)]
pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
    /// Per-document take serialization; version assignment is race-free even
    /// if two save triggers fire back to back.
    take_locks: Arc<Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>>,
}

impl SnapshotStore {
    pub fn new(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self {
            backend,
            take_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    async fn take_lock(&self, document_id: DocumentId) -> Arc<Mutex<()>> {
        let mut locks = self.take_locks.lock().await;
        locks.entry(document_id).or_default().clone()
    }

    /// Capture the document as `version = current_version + 1` and advance
    /// the document's version on success. A failed append leaves
    /// `current_version` untouched.
    pub async fn take(
        &self,
        doc: &mut Document,
        trigger: SaveTrigger,
        created_by: &str,
        label: Option<String>,
    ) -> CoreResult<Snapshot> {
        let lock = self.take_lock(doc.id).await;
        let _guard = lock.lock().await;

        let head = self.backend.head_version(doc.id)?;
        if head != doc.current_version {
            return Err(CoreError::VersionConflict {
                document_id: doc.id,
                store_head: head,
                expected: doc.current_version,
            });
        }
        let snapshot = Snapshot {
            document_id: doc.id,
            version: doc.current_version + 1,
            meta: doc.meta.clone(),
            blocks: doc.blocks.clone(),
            label,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            trigger,
        };
        self.backend.append(snapshot.clone())?;
        doc.current_version = snapshot.version;
        tracing::debug!(
            document_id = %doc.id,
            version = snapshot.version,
            ?trigger,
            "snapshot taken"
        );
        Ok(snapshot)
    }

    /// Snapshot headers for a document, newest first.
    pub async fn list(&self, document_id: DocumentId) -> CoreResult<Vec<SnapshotHeader>> {
        self.backend.list(document_id)
    }

    /// Full snapshot for one version.
    pub async fn get(&self, document_id: DocumentId, version: u64) -> CoreResult<Snapshot> {
        self.backend.get(document_id, version)
    }

    /// Attach or overwrite the human label on an existing snapshot. Never
    /// creates a new version.
    pub async fn label(
        &self,
        document_id: DocumentId,
        version: u64,
        text: impl Into<String>,
    ) -> CoreResult<()> {
        self.backend.set_label(document_id, version, text.into())
    }
}
