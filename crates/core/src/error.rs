use crate::block::BlockId;
use crate::document::DocumentId;

/// Error taxonomy for all core operations.
///
/// Validation errors (`InvalidIndex`, `UnknownBlock`, `SchemaMismatch`) are
/// caller mistakes: reported synchronously and the document is left
/// unmutated. `StoreUnavailable` is transient and retried by the autosave
/// controller; manual saves and restores surface it to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("index {index} out of range (document has {len} blocks)")]
    InvalidIndex { index: usize, len: usize },

    #[error("unknown block {0} in document")]
    UnknownBlock(BlockId),

    #[error("fields do not match block kind: {0}")]
    SchemaMismatch(String),

    #[error("document {document_id} has no version {version}")]
    NotFound {
        document_id: DocumentId,
        version: u64,
    },

    #[error("unknown document {0}")]
    UnknownDocument(DocumentId),

    #[error("snapshot store unavailable: {0}")]
    StoreUnavailable(String),

    /// Reserved for multi-writer deployments. The single-writer model cannot
    /// trigger this, but version assignment checks for it so a second writer
    /// fails loudly instead of double-assigning versions.
    #[error("version conflict on document {document_id}: store head is {store_head}, document expects {expected}")]
    VersionConflict {
        document_id: DocumentId,
        store_head: u64,
        expected: u64,
    },

    #[error("slug {0:?} is already in use")]
    SlugTaken(String),

    #[error("invalid slug {0:?}: lowercase letters, digits and hyphens only")]
    InvalidSlug(String),
}

/// Convenience alias used across the crate.
pub type CoreResult<T> = Result<T, CoreError>;
