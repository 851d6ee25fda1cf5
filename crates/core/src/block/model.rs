use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ordering::PositionKey;

/// Opaque block identifier. Stable across reorders and edits; never reused
/// after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The six content block kinds the editor offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Text,
    ImageLeft,
    ImageRight,
    Quote,
    Cta,
    List,
}

/// Kind-specific block payload. The variant fixes the field schema; a kind
/// change is modeled as delete + insert, never as mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum BlockFields {
    Text {
        content: String,
    },
    ImageLeft {
        image_ref: String,
        text: String,
    },
    ImageRight {
        image_ref: String,
        text: String,
    },
    Quote {
        content: String,
        author: String,
    },
    Cta {
        title: String,
        description: String,
        button_text: String,
        button_link: String,
    },
    List {
        title: String,
        items: Vec<String>,
    },
}

impl BlockFields {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockFields::Text { .. } => BlockKind::Text,
            BlockFields::ImageLeft { .. } => BlockKind::ImageLeft,
            BlockFields::ImageRight { .. } => BlockKind::ImageRight,
            BlockFields::Quote { .. } => BlockKind::Quote,
            BlockFields::Cta { .. } => BlockKind::Cta,
            BlockFields::List { .. } => BlockKind::List,
        }
    }

    /// Named fields as a JSON map, used by the diff engine's field-level
    /// sub-diff. The `kind` tag is stripped; it is identity, not content.
    pub fn to_field_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("kind");
                map
            }
            _ => serde_json::Map::new(),
        }
    }
}

/// Atomic content unit of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub fields: BlockFields,
    pub position: PositionKey,
}

impl Block {
    pub fn new(fields: BlockFields, position: PositionKey) -> Self {
        Self {
            id: BlockId::new(),
            fields,
            position,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.fields.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let fields = BlockFields::Quote {
            content: "q".into(),
            author: "a".into(),
        };
        assert_eq!(fields.kind(), BlockKind::Quote);
    }

    #[test]
    fn field_map_strips_kind_tag() {
        let fields = BlockFields::Cta {
            title: "t".into(),
            description: "d".into(),
            button_text: "go".into(),
            button_link: "/x".into(),
        };
        let map = fields.to_field_map();
        assert!(map.get("kind").is_none());
        assert_eq!(map.get("buttonText").unwrap(), "go");
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn serializes_with_kebab_case_kind() {
        let block = Block::new(
            BlockFields::ImageLeft {
                image_ref: "img-1".into(),
                text: "caption".into(),
            },
            PositionKey::first(),
        );
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["kind"], "image-left");
        assert_eq!(json["imageRef"], "img-1");
    }
}
