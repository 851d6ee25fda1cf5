//! In-memory owner of live documents.
//!
//! The registry hands out deep copies; mutation goes through an editing
//! session which writes back via [`DocumentRegistry::put`]. Slug uniqueness
//! among non-deleted documents is enforced here, at the only place that can
//! see every document.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::document::validate::validate_slug;
use crate::document::{Document, DocumentId, DocumentMeta};
use crate::error::{CoreError, CoreResult};
use crate::template::Template;

#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    inner: Arc<RwLock<HashMap<DocumentId, Document>>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document.
    pub async fn create(&self, meta: DocumentMeta) -> CoreResult<Document> {
        self.create_with(meta, None).await
    }

    /// Create a document seeded with a template's block sequence.
    pub async fn create_from_template(
        &self,
        meta: DocumentMeta,
        template: &Template,
    ) -> CoreResult<Document> {
        self.create_with(meta, Some(template)).await
    }

    async fn create_with(
        &self,
        meta: DocumentMeta,
        template: Option<&Template>,
    ) -> CoreResult<Document> {
        validate_slug(&meta.slug)?;
        let mut docs = self.inner.write().await;
        if docs.values().any(|d| !d.deleted && d.meta.slug == meta.slug) {
            return Err(CoreError::SlugTaken(meta.slug));
        }
        let mut doc = Document::new(meta);
        if let Some(template) = template {
            crate::document::ops::seed_blocks(&mut doc, template.blocks());
        }
        docs.insert(doc.id, doc.clone());
        tracing::info!(document_id = %doc.id, slug = %doc.meta.slug, "document created");
        Ok(doc)
    }

    pub async fn get(&self, id: DocumentId) -> CoreResult<Document> {
        let docs = self.inner.read().await;
        docs.get(&id)
            .filter(|d| !d.deleted)
            .cloned()
            .ok_or(CoreError::UnknownDocument(id))
    }

    /// Write back a mutated document (editing-session flush).
    pub async fn put(&self, doc: Document) -> CoreResult<()> {
        let mut docs = self.inner.write().await;
        if !docs.contains_key(&doc.id) {
            return Err(CoreError::UnknownDocument(doc.id));
        }
        docs.insert(doc.id, doc);
        Ok(())
    }

    /// Update top-level metadata, re-checking slug uniqueness when it changes.
    pub async fn update_meta(&self, id: DocumentId, meta: DocumentMeta) -> CoreResult<Document> {
        validate_slug(&meta.slug)?;
        let mut docs = self.inner.write().await;
        if docs
            .values()
            .any(|d| d.id != id && !d.deleted && d.meta.slug == meta.slug)
        {
            return Err(CoreError::SlugTaken(meta.slug));
        }
        let doc = docs
            .get_mut(&id)
            .filter(|d| !d.deleted)
            .ok_or(CoreError::UnknownDocument(id))?;
        doc.meta = meta;
        doc.updated_at = chrono::Utc::now();
        Ok(doc.clone())
    }

    /// Soft delete: the record stays addressable by snapshots, but its slug
    /// is released for reuse.
    pub async fn soft_delete(&self, id: DocumentId) -> CoreResult<()> {
        let mut docs = self.inner.write().await;
        let doc = docs
            .get_mut(&id)
            .filter(|d| !d.deleted)
            .ok_or(CoreError::UnknownDocument(id))?;
        doc.deleted = true;
        doc.updated_at = chrono::Utc::now();
        tracing::info!(document_id = %id, "document soft-deleted");
        Ok(())
    }

    /// All live documents, most recently updated first.
    pub async fn list(&self) -> Vec<Document> {
        let docs = self.inner.read().await;
        let mut live: Vec<_> = docs.values().filter(|d| !d.deleted).cloned().collect();
        live.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template;

    #[tokio::test]
    async fn slug_must_be_unique_among_live_documents() {
        let registry = DocumentRegistry::new();
        registry
            .create(DocumentMeta::draft("One", "launch-post"))
            .await
            .unwrap();
        let err = registry
            .create(DocumentMeta::draft("Two", "launch-post"))
            .await;
        assert!(matches!(err, Err(CoreError::SlugTaken(_))));
    }

    #[tokio::test]
    async fn soft_delete_releases_slug() {
        let registry = DocumentRegistry::new();
        let doc = registry
            .create(DocumentMeta::draft("One", "launch-post"))
            .await
            .unwrap();
        registry.soft_delete(doc.id).await.unwrap();

        assert!(matches!(
            registry.get(doc.id).await,
            Err(CoreError::UnknownDocument(_))
        ));
        registry
            .create(DocumentMeta::draft("Two", "launch-post"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn template_seeds_block_sequence() {
        let registry = DocumentRegistry::new();
        let doc = registry
            .create_from_template(
                DocumentMeta::draft("Launch", "launch"),
                &template::product_announcement(),
            )
            .await
            .unwrap();
        assert!(!doc.blocks.is_empty());
        for pair in doc.blocks.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
    }

    #[tokio::test]
    async fn invalid_slug_rejected() {
        let registry = DocumentRegistry::new();
        let err = registry.create(DocumentMeta::draft("X", "Bad Slug")).await;
        assert!(matches!(err, Err(CoreError::InvalidSlug(_))));
    }
}
