//! Block mutations on a live document.
//!
//! These functions are the only mutation path for `Document::blocks` and
//! uphold two invariants: the vector stays sorted by position key, and no
//! two blocks ever share a key. Every error path leaves the document
//! untouched.

use chrono::Utc;

use crate::block::{validate::validate_fields, Block, BlockFields, BlockId};
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::ordering::{self, PositionKey, MAX_KEY_LEN};

/// Insert a new block at the requested visual index.
pub fn add_block(doc: &mut Document, fields: BlockFields, at_index: usize) -> CoreResult<BlockId> {
    if at_index > doc.blocks.len() {
        return Err(CoreError::InvalidIndex {
            index: at_index,
            len: doc.blocks.len(),
        });
    }
    validate_fields(&fields)?;
    let position = allocate_key(&mut doc.blocks, at_index);
    let block = Block::new(fields, position);
    let id = block.id;
    doc.blocks.insert(at_index, block);
    doc.updated_at = Utc::now();
    Ok(id)
}

/// Replace a block's fields wholesale. The kind is immutable; changing it is
/// modeled as remove + add by the caller.
pub fn update_block_fields(
    doc: &mut Document,
    block_id: BlockId,
    fields: BlockFields,
) -> CoreResult<()> {
    let idx = index_of(doc, block_id)?;
    if doc.blocks[idx].kind() != fields.kind() {
        return Err(CoreError::SchemaMismatch(format!(
            "block kind is immutable: have {:?}, got {:?}",
            doc.blocks[idx].kind(),
            fields.kind()
        )));
    }
    validate_fields(&fields)?;
    doc.blocks[idx].fields = fields;
    doc.updated_at = Utc::now();
    Ok(())
}

/// Delete a block. Its position key is retired, never reassigned, so a stale
/// reference from an in-flight drag can never alias a different block.
pub fn remove_block(doc: &mut Document, block_id: BlockId) -> CoreResult<()> {
    let idx = index_of(doc, block_id)?;
    doc.blocks.remove(idx);
    doc.updated_at = Utc::now();
    Ok(())
}

/// Relocate a block immediately after `after` (to the front when `None`),
/// recomputing only the moved block's position key.
pub fn move_block(doc: &mut Document, block_id: BlockId, after: Option<BlockId>) -> CoreResult<()> {
    if after == Some(block_id) {
        // Dropping a block onto itself is a no-op.
        return Ok(());
    }
    let from = index_of(doc, block_id)?;
    let to = match after {
        None => 0,
        Some(anchor) => {
            let anchor_idx = index_of(doc, anchor)?;
            // Index in the vector once the moved block is taken out.
            if anchor_idx < from {
                anchor_idx + 1
            } else {
                anchor_idx
            }
        }
    };
    let mut block = doc.blocks.remove(from);
    block.position = allocate_key(&mut doc.blocks, to);
    doc.blocks.insert(to, block);
    doc.updated_at = Utc::now();
    Ok(())
}

/// Replace the whole block list (restore path), keeping block identity but
/// regenerating position keys: key spaces are local to a document's current
/// editing lineage, so stored keys are never reused.
pub fn replace_blocks(doc: &mut Document, blocks: Vec<Block>) {
    let keys = ordering::spread(None, None, blocks.len());
    doc.blocks = blocks
        .into_iter()
        .zip(keys)
        .map(|(mut block, key)| {
            block.position = key;
            block
        })
        .collect();
    doc.updated_at = Utc::now();
}

/// Build a fresh block list from payloads (template seeding).
pub fn seed_blocks(doc: &mut Document, payloads: Vec<BlockFields>) {
    let keys = ordering::spread(None, None, payloads.len());
    doc.blocks = payloads
        .into_iter()
        .zip(keys)
        .map(|(fields, key)| Block::new(fields, key))
        .collect();
    doc.updated_at = Utc::now();
}

fn index_of(doc: &Document, block_id: BlockId) -> CoreResult<usize> {
    doc.blocks
        .iter()
        .position(|b| b.id == block_id)
        .ok_or(CoreError::UnknownBlock(block_id))
}

/// Allocate a key for the slot at `index` in an already-sorted block list.
///
/// The fast path synthesizes a midpoint between the slot's neighbors. When
/// the gap is exhausted (key past the precision bound) or the key would
/// collide with a racing write, the crowded run is locally rebalanced.
fn allocate_key(blocks: &mut Vec<Block>, index: usize) -> PositionKey {
    let low = index
        .checked_sub(1)
        .and_then(|i| blocks.get(i))
        .map(|b| &b.position);
    let high = blocks.get(index).map(|b| &b.position);
    let key = ordering::key_between(low, high);
    if key.len() <= MAX_KEY_LEN && !blocks.iter().any(|b| b.position == key) {
        return key;
    }
    tracing::debug!(slot = index, "position key space exhausted, rebalancing");
    rebalance_around(blocks, index)
}

/// Renumber only the contiguous run around `index`, widening the window one
/// block per side until the evenly spread keys fit the precision bound.
/// Returns the key reserved for the insertion slot.
fn rebalance_around(blocks: &mut [Block], index: usize) -> PositionKey {
    let mut lo = index.saturating_sub(1);
    let mut hi = (index + 1).min(blocks.len());
    loop {
        let low = lo
            .checked_sub(1)
            .and_then(|i| blocks.get(i))
            .map(|b| b.position.clone());
        let high = blocks.get(hi).map(|b| b.position.clone());
        // One extra key for the insertion slot itself.
        let keys = ordering::spread(low.as_ref(), high.as_ref(), hi - lo + 1);
        let at_full_width = lo == 0 && hi == blocks.len();
        if keys.iter().all(|k| k.len() <= MAX_KEY_LEN) || at_full_width {
            let mut slot_key = PositionKey::first();
            for (j, key) in keys.into_iter().enumerate() {
                match (lo + j).cmp(&index) {
                    std::cmp::Ordering::Less => blocks[lo + j].position = key,
                    std::cmp::Ordering::Equal => slot_key = key,
                    std::cmp::Ordering::Greater => blocks[lo + j - 1].position = key,
                }
            }
            return slot_key;
        }
        lo = lo.saturating_sub(1);
        hi = (hi + 1).min(blocks.len());
    }
}
