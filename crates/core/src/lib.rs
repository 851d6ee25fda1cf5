//! Core document model for the block-based blog editor.
//!
//! A live [`document::Document`] is an ordered sequence of typed
//! [`block::Block`]s. Ordering uses fractional base-62 position keys
//! ([`ordering`]), history is an append-only stream of immutable
//! [`snapshot`]s, and the [`autosave`] controller turns edit bursts into
//! snapshots. [`session::EditorSession`] ties the pieces together and is the
//! surface the transport layer calls.

pub mod autosave;
pub mod block;
pub mod diff;
pub mod document;
pub mod error;
pub mod events;
pub mod ordering;
pub mod session;
pub mod snapshot;
pub mod template;

pub use error::{CoreError, CoreResult};
