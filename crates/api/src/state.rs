use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use blockdraft_core::document::{DocumentId, DocumentRegistry};
use blockdraft_core::events::EventBus;
use blockdraft_core::session::EditorSession;
use blockdraft_core::snapshot::SnapshotStore;
use blockdraft_core::CoreResult;
use tokio::sync::Mutex;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor. Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    registry: DocumentRegistry,
    store: SnapshotStore,
    event_bus: EventBus,
    config: AppConfig,
    /// One editing session per open document; single writer per document.
    sessions: Mutex<HashMap<DocumentId, Arc<EditorSession>>>,
}

impl AppState {
    pub fn new(
        registry: DocumentRegistry,
        store: SnapshotStore,
        event_bus: EventBus,
        config: AppConfig,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                registry,
                store,
                event_bus,
                config,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.inner.registry
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// The open session for a document, created on first use. `actor` comes
    /// from the identity collaborator and is assumed pre-authorized.
    pub async fn session(
        &self,
        document_id: DocumentId,
        actor: &str,
    ) -> CoreResult<Arc<EditorSession>> {
        let mut sessions = self.inner.sessions.lock().await;
        if let Some(session) = sessions.get(&document_id) {
            return Ok(session.clone());
        }
        let session = Arc::new(
            EditorSession::open_with_debounce(
                self.inner.registry.clone(),
                self.inner.store.clone(),
                self.inner.event_bus.clone(),
                document_id,
                actor,
                Duration::from_millis(self.inner.config.autosave_debounce_ms),
            )
            .await?,
        );
        sessions.insert(document_id, session.clone());
        Ok(session)
    }

    /// Drop the open session for a document (on delete).
    pub async fn close_session(&self, document_id: DocumentId) {
        if let Some(session) = self.inner.sessions.lock().await.remove(&document_id) {
            session.close();
        }
    }
}
