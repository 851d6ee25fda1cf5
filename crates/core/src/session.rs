//! Editing session: the single writer for one live document.
//!
//! The session owns the document behind an async mutex, routes every
//! mutation through [`crate::document::ops`], notifies the autosave
//! controller, and writes the mutated copy back to the registry so readers
//! outside the session stay current. This is the surface the transport
//! layer calls; nothing above it touches positions or versions directly.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::autosave::{AutosaveController, SaveContext, DEFAULT_DEBOUNCE};
use crate::block::{BlockFields, BlockId};
use crate::diff::{self, DiffEntry};
use crate::document::{ops, Document, DocumentId, DocumentMeta, DocumentRegistry};
use crate::error::CoreResult;
use crate::events::types::SnapshotTakenEvent;
use crate::events::{EditorEvent, EventBus};
use crate::snapshot::{SaveTrigger, Snapshot, SnapshotStore};

pub struct EditorSession {
    document: Arc<Mutex<Document>>,
    store: SnapshotStore,
    registry: DocumentRegistry,
    events: EventBus,
    actor: String,
    autosave: AutosaveController,
}

impl EditorSession {
    /// Open a session for an existing document. The identity context has
    /// already authorized `actor` for this document.
    pub async fn open(
        registry: DocumentRegistry,
        store: SnapshotStore,
        events: EventBus,
        document_id: DocumentId,
        actor: impl Into<String>,
    ) -> CoreResult<Self> {
        Self::open_with_debounce(registry, store, events, document_id, actor, DEFAULT_DEBOUNCE)
            .await
    }

    pub async fn open_with_debounce(
        registry: DocumentRegistry,
        store: SnapshotStore,
        events: EventBus,
        document_id: DocumentId,
        actor: impl Into<String>,
        debounce: Duration,
    ) -> CoreResult<Self> {
        let actor = actor.into();
        let document = Arc::new(Mutex::new(registry.get(document_id).await?));
        let ctx = SaveContext {
            document: document.clone(),
            store: store.clone(),
            registry: registry.clone(),
            events: events.clone(),
            actor: actor.clone(),
        };
        let autosave = AutosaveController::spawn(ctx, debounce);
        Ok(Self {
            document,
            store,
            registry,
            events,
            actor,
            autosave,
        })
    }

    /// Current state of the live document.
    pub async fn document(&self) -> Document {
        self.document.lock().await.clone()
    }

    pub async fn add_block(&self, fields: BlockFields, at_index: usize) -> CoreResult<BlockId> {
        let mut doc = self.document.lock().await;
        let id = ops::add_block(&mut doc, fields, at_index)?;
        self.flush(&doc).await?;
        drop(doc);
        self.autosave.note_edit();
        Ok(id)
    }

    pub async fn update_block_fields(
        &self,
        block_id: BlockId,
        fields: BlockFields,
    ) -> CoreResult<()> {
        let mut doc = self.document.lock().await;
        ops::update_block_fields(&mut doc, block_id, fields)?;
        self.flush(&doc).await?;
        drop(doc);
        self.autosave.note_edit();
        Ok(())
    }

    pub async fn remove_block(&self, block_id: BlockId) -> CoreResult<()> {
        let mut doc = self.document.lock().await;
        ops::remove_block(&mut doc, block_id)?;
        self.flush(&doc).await?;
        drop(doc);
        self.autosave.note_edit();
        Ok(())
    }

    pub async fn move_block(&self, block_id: BlockId, after: Option<BlockId>) -> CoreResult<()> {
        let mut doc = self.document.lock().await;
        ops::move_block(&mut doc, block_id, after)?;
        self.flush(&doc).await?;
        drop(doc);
        self.autosave.note_edit();
        Ok(())
    }

    /// Replace top-level metadata; slug uniqueness is checked by the
    /// registry before the session copy is touched.
    pub async fn update_meta(&self, meta: DocumentMeta) -> CoreResult<()> {
        let mut doc = self.document.lock().await;
        self.registry.update_meta(doc.id, meta.clone()).await?;
        doc.meta = meta;
        doc.updated_at = Utc::now();
        drop(doc);
        self.autosave.note_edit();
        Ok(())
    }

    /// Explicit save-button save.
    pub async fn save(&self) -> CoreResult<Snapshot> {
        self.autosave.save_now().await
    }

    /// Replace the live blocks with a prior snapshot's, then record the
    /// restore as a new version. History is never rewritten: the intervening
    /// versions stay retrievable, and restoring to content identical to the
    /// live state still appends a snapshot.
    pub async fn restore(&self, version: u64) -> CoreResult<Snapshot> {
        let mut doc = self.document.lock().await;
        let target = self.store.get(doc.id, version).await?;
        // Keep the old list so a failed take can roll back: the registry
        // must never disagree with the session about the live document.
        let previous = std::mem::take(&mut doc.blocks);
        ops::replace_blocks(&mut doc, target.blocks);
        let snapshot = match self
            .store
            .take(&mut doc, SaveTrigger::Restore, &self.actor, None)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                doc.blocks = previous;
                return Err(err);
            }
        };
        self.flush(&doc).await?;
        drop(doc);
        // Any pending autosave covered edits the restore just replaced.
        self.autosave.cancel_pending();
        self.events.publish(EditorEvent::SnapshotTaken(SnapshotTakenEvent {
            document_id: snapshot.document_id,
            version: snapshot.version,
            trigger: SaveTrigger::Restore,
            timestamp: Utc::now(),
        }));
        tracing::info!(
            document_id = %snapshot.document_id,
            restored_from = version,
            new_version = snapshot.version,
            "restored document"
        );
        Ok(snapshot)
    }

    /// Structural comparison of two stored versions.
    pub async fn compare(&self, from: u64, to: u64) -> CoreResult<Vec<DiffEntry>> {
        let doc_id = { self.document.lock().await.id };
        let from = self.store.get(doc_id, from).await?;
        let to = self.store.get(doc_id, to).await?;
        Ok(diff::diff(&from.blocks, &to.blocks))
    }

    pub fn close(&self) {
        self.autosave.shutdown();
    }

    async fn flush(&self, doc: &Document) -> CoreResult<()> {
        self.registry.put(doc.clone()).await
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.autosave.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEntry;
    use crate::error::CoreError;
    use crate::snapshot::{MemoryBackend, SnapshotBackend, SnapshotHeader};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Backend whose read path stays healthy while the write path is down,
    /// the shape of a partial storage outage.
    struct FlakyWriteBackend {
        inner: MemoryBackend,
        writes_down: AtomicBool,
    }

    impl FlakyWriteBackend {
        fn new() -> Self {
            Self {
                inner: MemoryBackend::new(),
                writes_down: AtomicBool::new(false),
            }
        }

        fn set_writes_available(&self, available: bool) {
            self.writes_down.store(!available, Ordering::SeqCst);
        }
    }

    impl SnapshotBackend for FlakyWriteBackend {
        fn append(&self, snapshot: Snapshot) -> CoreResult<()> {
            if self.writes_down.load(Ordering::SeqCst) {
                return Err(crate::CoreError::StoreUnavailable(
                    "write path offline".into(),
                ));
            }
            self.inner.append(snapshot)
        }

        fn head_version(&self, document_id: DocumentId) -> CoreResult<u64> {
            self.inner.head_version(document_id)
        }

        fn list(&self, document_id: DocumentId) -> CoreResult<Vec<SnapshotHeader>> {
            self.inner.list(document_id)
        }

        fn get(&self, document_id: DocumentId, version: u64) -> CoreResult<Snapshot> {
            self.inner.get(document_id, version)
        }

        fn set_label(
            &self,
            document_id: DocumentId,
            version: u64,
            label: String,
        ) -> CoreResult<()> {
            self.inner.set_label(document_id, version, label)
        }
    }

    async fn session() -> (EditorSession, DocumentRegistry, SnapshotStore) {
        let registry = DocumentRegistry::new();
        let store = SnapshotStore::in_memory();
        let events = EventBus::default();
        let doc = registry
            .create(DocumentMeta::draft("Post", "post"))
            .await
            .unwrap();
        let session = EditorSession::open(
            registry.clone(),
            store.clone(),
            events,
            doc.id,
            "ana",
        )
        .await
        .unwrap();
        (session, registry, store)
    }

    fn text(s: &str) -> BlockFields {
        BlockFields::Text { content: s.into() }
    }

    #[tokio::test(start_paused = true)]
    async fn move_then_compare_reports_both_blocks_moved() {
        let (session, _registry, _store) = session().await;
        let a = session.add_block(text("A"), 0).await.unwrap();
        let b = session
            .add_block(
                BlockFields::Quote {
                    content: "B".into(),
                    author: "X".into(),
                },
                1,
            )
            .await
            .unwrap();
        session.save().await.unwrap();

        session.move_block(a, Some(b)).await.unwrap();
        session.save().await.unwrap();

        let entries = session.compare(1, 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| matches!(e, DiffEntry::Moved { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_appends_history_and_preserves_intervening_versions() {
        let (session, _registry, store) = session().await;
        session.add_block(text("first draft"), 0).await.unwrap();
        session.save().await.unwrap();

        let doc = session.document().await;
        session
            .update_block_fields(doc.blocks[0].id, text("second draft"))
            .await
            .unwrap();
        session.save().await.unwrap();

        let restored = session.restore(1).await.unwrap();
        assert_eq!(restored.version, 3);
        assert_eq!(restored.trigger, SaveTrigger::Restore);

        let doc = session.document().await;
        assert_eq!(doc.current_version, 3);
        assert!(matches!(
            &doc.blocks[0].fields,
            BlockFields::Text { content } if content == "first draft"
        ));

        // v2 is still there, untouched.
        let v2 = store.get(doc.id, 2).await.unwrap();
        assert!(matches!(
            &v2.blocks[0].fields,
            BlockFields::Text { content } if content == "second draft"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_round_trip_matches_field_for_field() {
        let (session, _registry, store) = session().await;
        session.add_block(text("a"), 0).await.unwrap();
        session
            .add_block(
                BlockFields::List {
                    title: "Steps".into(),
                    items: vec!["one".into(), "two".into()],
                },
                1,
            )
            .await
            .unwrap();
        session.save().await.unwrap();
        let doc = session.document().await;
        session.remove_block(doc.blocks[0].id).await.unwrap();
        session.save().await.unwrap();

        session.restore(1).await.unwrap();
        let doc = session.document().await;
        let v1 = store.get(doc.id, 1).await.unwrap();
        let live = store.get(doc.id, doc.current_version).await.unwrap();

        assert_eq!(live.blocks.len(), v1.blocks.len());
        for (a, b) in live.blocks.iter().zip(v1.blocks.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.fields, b.fields);
            // Position keys are lineage-local and deliberately not compared.
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restore_to_identical_content_still_appends() {
        let (session, _registry, _store) = session().await;
        session.add_block(text("a"), 0).await.unwrap();
        session.save().await.unwrap();

        let restored = session.restore(1).await.unwrap();
        assert_eq!(restored.version, 2);
        let entries = session.compare(1, 2).await.unwrap();
        assert!(entries
            .iter()
            .all(|e| matches!(e, DiffEntry::Unchanged { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_restore_rolls_back_and_keeps_registry_in_sync() {
        let registry = DocumentRegistry::new();
        let backend = Arc::new(FlakyWriteBackend::new());
        let store = SnapshotStore::new(backend.clone());
        let doc = registry
            .create(DocumentMeta::draft("Post", "post"))
            .await
            .unwrap();
        let session = EditorSession::open(
            registry.clone(),
            store.clone(),
            EventBus::default(),
            doc.id,
            "ana",
        )
        .await
        .unwrap();

        session.add_block(text("first draft"), 0).await.unwrap();
        session.save().await.unwrap();
        let block_id = session.document().await.blocks[0].id;
        session
            .update_block_fields(block_id, text("second draft"))
            .await
            .unwrap();
        session.save().await.unwrap();

        // Reads still work, so the target snapshot is fetched; the take
        // that records the restore is what fails.
        backend.set_writes_available(false);
        let err = session.restore(1).await;
        assert!(matches!(err, Err(CoreError::StoreUnavailable(_))));

        // Session and registry must agree on the pre-restore content.
        let live = session.document().await;
        let from_registry = registry.get(doc.id).await.unwrap();
        assert!(matches!(
            &live.blocks[0].fields,
            BlockFields::Text { content } if content == "second draft"
        ));
        assert!(matches!(
            &from_registry.blocks[0].fields,
            BlockFields::Text { content } if content == "second draft"
        ));
        assert_eq!(live.current_version, 2);

        // Store recovers; the retried restore lands as version 3.
        backend.set_writes_available(true);
        let restored = session.restore(1).await.unwrap();
        assert_eq!(restored.version, 3);
        assert!(matches!(
            &session.document().await.blocks[0].fields,
            BlockFields::Text { content } if content == "first draft"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_unknown_version_fails() {
        let (session, _registry, _store) = session().await;
        session.add_block(text("a"), 0).await.unwrap();
        session.save().await.unwrap();

        let err = session.restore(9).await;
        assert!(matches!(err, Err(CoreError::NotFound { version: 9, .. })));
        assert_eq!(session.document().await.current_version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_writes_back_to_registry() {
        let (session, registry, _store) = session().await;
        session.add_block(text("visible"), 0).await.unwrap();

        let doc_id = session.document().await.id;
        let from_registry = registry.get(doc_id).await.unwrap();
        assert_eq!(from_registry.blocks.len(), 1);
    }
}
