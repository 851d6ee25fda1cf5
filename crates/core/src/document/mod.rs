pub mod model;
pub mod ops;
pub mod registry;
pub mod validate;

pub use model::{Document, DocumentId, DocumentMeta, DocumentStatus};
pub use registry::DocumentRegistry;
