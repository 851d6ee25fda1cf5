use crate::error::{CoreError, CoreResult};

/// Validate slug shape: lowercase alphanumeric segments separated by single
/// hyphens, as the public site expects in its URLs.
pub fn validate_slug(slug: &str) -> CoreResult<()> {
    let well_formed = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::InvalidSlug(slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_slugs() {
        assert!(validate_slug("complete-content-block-test").is_ok());
        assert!(validate_slug("post2").is_ok());
    }

    #[test]
    fn rejects_malformed_slugs() {
        for bad in ["", "Upper", "with space", "-lead", "trail-", "two--hyphens", "émoji"] {
            assert!(validate_slug(bad).is_err(), "should reject {bad:?}");
        }
    }
}
