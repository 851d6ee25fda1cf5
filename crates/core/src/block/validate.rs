use crate::block::BlockFields;
use crate::error::{CoreError, CoreResult};

/// Validate a block payload against its kind's schema.
///
/// Runs at the `update_block_fields` / `add_block` boundary so invalid
/// content never reaches the document. Text-like payloads may be empty (an
/// author mid-edit), but structural requirements are enforced.
pub fn validate_fields(fields: &BlockFields) -> CoreResult<()> {
    match fields {
        BlockFields::Text { .. } => Ok(()),
        BlockFields::ImageLeft { image_ref, .. } | BlockFields::ImageRight { image_ref, .. } => {
            if image_ref.trim().is_empty() {
                return Err(CoreError::SchemaMismatch(
                    "image block requires a non-empty imageRef".into(),
                ));
            }
            Ok(())
        }
        BlockFields::Quote { .. } => Ok(()),
        BlockFields::Cta { button_link, .. } => {
            if button_link.trim().is_empty() {
                return Err(CoreError::SchemaMismatch(
                    "cta block requires a non-empty buttonLink".into(),
                ));
            }
            Ok(())
        }
        BlockFields::List { items, .. } => {
            if items.is_empty() {
                return Err(CoreError::SchemaMismatch(
                    "list block requires at least one item".into(),
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_items_rejected() {
        let fields = BlockFields::List {
            title: "Checklist".into(),
            items: vec![],
        };
        assert!(matches!(
            validate_fields(&fields),
            Err(CoreError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn empty_text_content_allowed() {
        let fields = BlockFields::Text { content: "".into() };
        assert!(validate_fields(&fields).is_ok());
    }

    #[test]
    fn blank_image_ref_rejected() {
        let fields = BlockFields::ImageRight {
            image_ref: "  ".into(),
            text: "caption".into(),
        };
        assert!(validate_fields(&fields).is_err());
    }
}
