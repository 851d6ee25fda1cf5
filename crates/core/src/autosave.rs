//! Debounced autosave.
//!
//! One controller task per editing session, fed by a command channel. The
//! task is the single timeline for that document's saves: the debounce timer
//! and every `take` run inside it, so a save can never overlap another and a
//! manual save arriving mid-write simply queues behind it.
//!
//! State machine: `Idle -> PendingSave (debounced) -> Saving -> Idle`.
//! Edits (re)arm the timer, coalescing a burst into one snapshot. A manual
//! save cancels the pending timer and saves immediately, so a burst never
//! produces both an autosave and a manual snapshot. A failed autosave keeps
//! the session in `PendingSave` and retries on the next expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;

use crate::document::{Document, DocumentRegistry};
use crate::error::{CoreError, CoreResult};
use crate::events::types::{SaveFailedEvent, SnapshotTakenEvent};
use crate::events::{EditorEvent, EventBus};
use crate::snapshot::{SaveTrigger, Snapshot, SnapshotStore};

/// Default debounce window between the last edit and the autosave.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

enum Command {
    Edited,
    ManualSave(oneshot::Sender<CoreResult<Snapshot>>),
    CancelPending,
    Shutdown,
}

/// Everything a save needs; shared with the session that owns the document.
#[derive(Clone)]
pub(crate) struct SaveContext {
    pub document: Arc<Mutex<Document>>,
    pub store: SnapshotStore,
    pub registry: DocumentRegistry,
    pub events: EventBus,
    pub actor: String,
}

impl SaveContext {
    pub(crate) async fn save(&self, trigger: SaveTrigger) -> CoreResult<Snapshot> {
        let mut doc = self.document.lock().await;
        let snapshot = self.store.take(&mut doc, trigger, &self.actor, None).await?;
        // Write back so registry readers observe the advanced version.
        self.registry.put(doc.clone()).await?;
        self.events.publish(EditorEvent::SnapshotTaken(SnapshotTakenEvent {
            document_id: snapshot.document_id,
            version: snapshot.version,
            trigger,
            timestamp: Utc::now(),
        }));
        Ok(snapshot)
    }
}

/// Handle to a session's autosave task.
pub struct AutosaveController {
    tx: mpsc::UnboundedSender<Command>,
}

impl AutosaveController {
    pub(crate) fn spawn(ctx: SaveContext, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(ctx, debounce, rx));
        Self { tx }
    }

    /// Record a mutation: arms (or re-arms) the debounce timer.
    pub fn note_edit(&self) {
        let _ = self.tx.send(Command::Edited);
    }

    /// Save immediately with `trigger = manual-save`, suppressing any
    /// pending autosave for the same edit burst.
    pub async fn save_now(&self) -> CoreResult<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::ManualSave(reply))
            .map_err(|_| CoreError::StoreUnavailable("autosave controller stopped".into()))?;
        rx.await
            .map_err(|_| CoreError::StoreUnavailable("autosave controller stopped".into()))?
    }

    /// Drop any pending debounce timer (restore already captured the state).
    pub fn cancel_pending(&self) {
        let _ = self.tx.send(Command::CancelPending);
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

async fn run(ctx: SaveContext, debounce: Duration, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut deadline: Option<Instant> = None;
    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Edited) => {
                    deadline = Some(Instant::now() + debounce);
                }
                Some(Command::ManualSave(reply)) => {
                    deadline = None;
                    let result = ctx.save(SaveTrigger::ManualSave).await;
                    let _ = reply.send(result);
                }
                Some(Command::CancelPending) => {
                    deadline = None;
                }
                Some(Command::Shutdown) | None => break,
            },
            _ = sleep_until_opt(deadline) => {
                match ctx.save(SaveTrigger::Autosave).await {
                    Ok(_) => {
                        deadline = None;
                    }
                    Err(err) => {
                        // Back to PendingSave: the in-memory edits are
                        // intact, retry on the next expiry.
                        tracing::warn!(actor = %ctx.actor, error = %err, "autosave failed, will retry");
                        let document_id = { ctx.document.lock().await.id };
                        ctx.events.publish(EditorEvent::SaveFailed(SaveFailedEvent {
                            document_id,
                            reason: err.to_string(),
                            timestamp: Utc::now(),
                        }));
                        deadline = Some(Instant::now() + debounce);
                    }
                }
            }
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockFields;
    use crate::document::{ops, DocumentMeta};
    use crate::snapshot::MemoryBackend;

    struct Rig {
        controller: AutosaveController,
        document: Arc<Mutex<Document>>,
        store: SnapshotStore,
        backend: Arc<MemoryBackend>,
        events: EventBus,
    }

    async fn rig() -> Rig {
        let registry = DocumentRegistry::new();
        let doc = registry
            .create(DocumentMeta::draft("Post", "post"))
            .await
            .unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let store = SnapshotStore::new(backend.clone());
        let events = EventBus::new(16);
        let document = Arc::new(Mutex::new(doc));
        let ctx = SaveContext {
            document: document.clone(),
            store: store.clone(),
            registry,
            events: events.clone(),
            actor: "ana".into(),
        };
        Rig {
            controller: AutosaveController::spawn(ctx, DEFAULT_DEBOUNCE),
            document,
            store,
            backend,
            events,
        }
    }

    async fn edit(rig: &Rig, content: &str) {
        let mut doc = rig.document.lock().await;
        ops::add_block(
            &mut doc,
            BlockFields::Text {
                content: content.into(),
            },
            0,
        )
        .unwrap();
        drop(doc);
        rig.controller.note_edit();
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_one_autosave() {
        let rig = rig().await;
        let doc_id = { rig.document.lock().await.id };

        for i in 0..3 {
            edit(&rig, &format!("edit {i}")).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        let headers = rig.store.list(doc_id).await.unwrap();
        assert_eq!(headers.len(), 1, "three edits in one window = one snapshot");
        assert_eq!(headers[0].trigger, SaveTrigger::Autosave);
    }

    #[tokio::test(start_paused = true)]
    async fn each_settled_burst_gets_its_own_snapshot() {
        let rig = rig().await;
        let doc_id = { rig.document.lock().await.id };

        edit(&rig, "one").await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        edit(&rig, "two").await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        let headers = rig.store.list(doc_id).await.unwrap();
        let versions: Vec<_> = headers.iter().map(|h| h.version).collect();
        assert_eq!(versions, [2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_save_preempts_pending_autosave() {
        let rig = rig().await;
        let doc_id = { rig.document.lock().await.id };

        edit(&rig, "draft").await;
        let snapshot = rig.controller.save_now().await.unwrap();
        assert_eq!(snapshot.trigger, SaveTrigger::ManualSave);

        // The debounce window passes; the suppressed autosave must not fire.
        tokio::time::sleep(DEFAULT_DEBOUNCE * 3).await;
        let headers = rig.store.list(doc_id).await.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].trigger, SaveTrigger::ManualSave);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_autosave_retries_and_signals() {
        let rig = rig().await;
        let doc_id = { rig.document.lock().await.id };
        let mut events = rig.events.subscribe();

        rig.backend.set_available(false);
        edit(&rig, "offline edit").await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        // Save failed, user signal published, nothing persisted.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, EditorEvent::SaveFailed(_)));
        assert_eq!(rig.document.lock().await.current_version, 0);

        // Store comes back; the retry picks the edit up unchanged.
        rig.backend.set_available(true);
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        let headers = rig.store.list(doc_id).await.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].version, 1);
        assert_eq!(rig.document.lock().await.current_version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn versions_stay_monotonic_across_trigger_interleavings() {
        let rig = rig().await;
        let doc_id = { rig.document.lock().await.id };

        edit(&rig, "a").await;
        rig.controller.save_now().await.unwrap();
        edit(&rig, "b").await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        edit(&rig, "c").await;
        rig.controller.save_now().await.unwrap();

        let mut versions: Vec<_> = rig
            .store
            .list(doc_id)
            .await
            .unwrap()
            .iter()
            .map(|h| h.version)
            .collect();
        versions.reverse();
        assert_eq!(versions, [1, 2, 3]);
    }
}
