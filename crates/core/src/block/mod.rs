pub mod model;
pub mod validate;

pub use model::{Block, BlockFields, BlockId, BlockKind};
