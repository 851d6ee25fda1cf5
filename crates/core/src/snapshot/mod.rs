pub mod store;
pub mod types;

pub use store::{MemoryBackend, SnapshotBackend, SnapshotStore};
pub use types::{SaveTrigger, Snapshot, SnapshotHeader};
