//! Canned starting points for new documents.
//!
//! A template is just a named initial block sequence; creating a document
//! from one seeds its block list with fresh ids and evenly spaced keys.

use serde::{Deserialize, Serialize};

use crate::block::BlockFields;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    blocks: Vec<BlockFields>,
}

impl Template {
    pub fn new(name: impl Into<String>, blocks: Vec<BlockFields>) -> Self {
        Self {
            name: name.into(),
            blocks,
        }
    }

    /// Deep copy of the template's block payloads.
    pub fn blocks(&self) -> Vec<BlockFields> {
        self.blocks.clone()
    }
}

/// Empty canvas.
pub fn blank() -> Template {
    Template::new("blank", Vec::new())
}

/// Product announcement: overview, highlight quote, feature list, call to
/// action.
pub fn product_announcement() -> Template {
    Template::new(
        "product-announcement",
        vec![
            BlockFields::Text {
                content: "Product Overview".into(),
            },
            BlockFields::Quote {
                content: String::new(),
                author: String::new(),
            },
            BlockFields::List {
                title: "Key Features".into(),
                items: vec![String::new()],
            },
            BlockFields::Cta {
                title: "Try it today".into(),
                description: String::new(),
                button_text: "Get started".into(),
                button_link: "/signup".into(),
            },
        ],
    )
}

/// Step-by-step guide: intro, steps list, closing text.
pub fn how_to_guide() -> Template {
    Template::new(
        "how-to-guide",
        vec![
            BlockFields::Text {
                content: "Introduction".into(),
            },
            BlockFields::List {
                title: "Steps".into(),
                items: vec![String::new()],
            },
            BlockFields::Text {
                content: String::new(),
            },
        ],
    )
}

/// All built-in templates, looked up by name from the editor's template tab.
pub fn builtin(name: &str) -> Option<Template> {
    match name {
        "blank" => Some(blank()),
        "product-announcement" => Some(product_announcement()),
        "how-to-guide" => Some(how_to_guide()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        assert!(builtin("product-announcement").is_some());
        assert!(builtin("nope").is_none());
    }

    #[test]
    fn announcement_opens_with_overview() {
        let t = product_announcement();
        let blocks = t.blocks();
        assert!(matches!(
            &blocks[0],
            BlockFields::Text { content } if content == "Product Overview"
        ));
    }
}
