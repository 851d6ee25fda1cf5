//! Structural diff between two block sequences.
//!
//! Blocks are aligned by id, never by position key: position keys belong to
//! the ordering engine and a rebalance must not show up as a "change".
//! Reordering is detected at identity level: a block counts as moved when
//! its neighbors among the blocks common to both versions changed, on
//! either side.

use serde::Serialize;
use serde_json::Value;
use similar::TextDiff;
use std::collections::{HashMap, HashSet};

use crate::block::{Block, BlockFields, BlockId, BlockKind};

/// Old/new pair for one named field of a modified block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// One entry of the comparison view, in the `to` sequence's final order
/// (removed blocks interleaved where they used to sit).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum DiffEntry {
    Added { block: Block },
    Removed { block: Block },
    Modified {
        id: BlockId,
        kind: BlockKind,
        changes: Vec<FieldChange>,
    },
    Moved { id: BlockId, kind: BlockKind },
    Unchanged { id: BlockId, kind: BlockKind },
}

impl DiffEntry {
    pub fn block_id(&self) -> BlockId {
        match self {
            DiffEntry::Added { block } | DiffEntry::Removed { block } => block.id,
            DiffEntry::Modified { id, .. }
            | DiffEntry::Moved { id, .. }
            | DiffEntry::Unchanged { id, .. } => *id,
        }
    }
}

/// Compute the structural diff from one block sequence to another.
///
/// A block whose kind changed under the same id is reported as removed plus
/// added; kinds are immutable in the model, so this only arises from data
/// created outside it.
pub fn diff(from: &[Block], to: &[Block]) -> Vec<DiffEntry> {
    let from_by_id: HashMap<BlockId, &Block> = from.iter().map(|b| (b.id, b)).collect();
    let to_by_id: HashMap<BlockId, &Block> = to.iter().map(|b| (b.id, b)).collect();

    let common: HashSet<BlockId> = from
        .iter()
        .filter(|b| to_by_id.get(&b.id).is_some_and(|t| t.kind() == b.kind()))
        .map(|b| b.id)
        .collect();

    let from_common: Vec<BlockId> = from.iter().map(|b| b.id).filter(|id| common.contains(id)).collect();
    let to_common: Vec<BlockId> = to.iter().map(|b| b.id).filter(|id| common.contains(id)).collect();
    let neighbors_in = |seq: &[BlockId], id: BlockId| -> (Option<BlockId>, Option<BlockId>) {
        match seq.iter().position(|&x| x == id) {
            Some(i) => (i.checked_sub(1).map(|p| seq[p]), seq.get(i + 1).copied()),
            None => (None, None),
        }
    };

    // Removed blocks keep their place in the rendered view by anchoring to
    // the next surviving common block in `from` (None = trailing).
    let mut removed_before: HashMap<Option<BlockId>, Vec<&Block>> = HashMap::new();
    for (i, block) in from.iter().enumerate() {
        if common.contains(&block.id) {
            continue;
        }
        let anchor = from[i + 1..]
            .iter()
            .map(|b| b.id)
            .find(|id| common.contains(id));
        removed_before.entry(anchor).or_default().push(block);
    }

    let mut entries = Vec::with_capacity(from.len() + to.len());
    let mut emit_removed = |anchor: Option<BlockId>, entries: &mut Vec<DiffEntry>| {
        for block in removed_before.remove(&anchor).unwrap_or_default() {
            entries.push(DiffEntry::Removed {
                block: block.clone(),
            });
        }
    };

    for block in to {
        if !common.contains(&block.id) {
            entries.push(DiffEntry::Added {
                block: block.clone(),
            });
            continue;
        }
        emit_removed(Some(block.id), &mut entries);
        let old = &from_by_id[&block.id];
        let changes = field_changes(&old.fields, &block.fields);
        if !changes.is_empty() {
            entries.push(DiffEntry::Modified {
                id: block.id,
                kind: block.kind(),
                changes,
            });
        } else if neighbors_in(&from_common, block.id) != neighbors_in(&to_common, block.id) {
            entries.push(DiffEntry::Moved {
                id: block.id,
                kind: block.kind(),
            });
        } else {
            entries.push(DiffEntry::Unchanged {
                id: block.id,
                kind: block.kind(),
            });
        }
    }
    emit_removed(None, &mut entries);
    entries
}

/// Field-level sub-diff between two payloads of the same kind.
fn field_changes(old: &BlockFields, new: &BlockFields) -> Vec<FieldChange> {
    let old_map = old.to_field_map();
    let new_map = new.to_field_map();
    old_map
        .iter()
        .filter(|(name, old_value)| new_map.get(name.as_str()) != Some(old_value))
        .map(|(name, old_value)| FieldChange {
            field: name.clone(),
            old: old_value.clone(),
            new: new_map.get(name.as_str()).cloned().unwrap_or(Value::Null),
        })
        .collect()
}

/// Render a diff as plain text for the comparison view. String fields of
/// modified blocks get a line-level old/new diff.
pub fn render(entries: &[DiffEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        match entry {
            DiffEntry::Added { block } => {
                out.push_str(&format!("+ {:?} {}\n", block.kind(), block.id));
            }
            DiffEntry::Removed { block } => {
                out.push_str(&format!("- {:?} {}\n", block.kind(), block.id));
            }
            DiffEntry::Moved { kind, id } => {
                out.push_str(&format!("~ moved {kind:?} {id}\n"));
            }
            DiffEntry::Unchanged { kind, id } => {
                out.push_str(&format!("  {kind:?} {id}\n"));
            }
            DiffEntry::Modified { kind, id, changes } => {
                out.push_str(&format!("* modified {kind:?} {id}\n"));
                for change in changes {
                    match (&change.old, &change.new) {
                        (Value::String(old), Value::String(new)) => {
                            out.push_str(&format!("    {}:\n", change.field));
                            for hunk in TextDiff::from_lines(old.as_str(), new.as_str()).iter_all_changes() {
                                out.push_str(&format!("      {}{}", hunk.tag(), hunk.value()));
                                if !hunk.value().ends_with('\n') {
                                    out.push('\n');
                                }
                            }
                        }
                        (old, new) => {
                            out.push_str(&format!("    {}: {} -> {}\n", change.field, old, new));
                        }
                    }
                }
            }
        }
    }
    out
}
