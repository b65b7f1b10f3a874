//! Local syntactic validation.
//!
//! These checks run before any remote call; a validation failure never
//! reaches the hosting provider.

use crate::error::{Result, ServiceError};

const NAME_MAX: usize = 100;
const SLUG_MAX: usize = 100;
const TITLE_MAX: usize = 200;

/// Site names: 1..=100 chars of letters, digits, spaces, hyphens and
/// underscores, with at least one alphanumeric.
pub fn site_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().count() > NAME_MAX {
        return Err(invalid("name", "must be between 1 and 100 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(invalid(
            "name",
            "may only contain letters, digits, spaces, hyphens and underscores",
        ));
    }
    if !name.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("name", "must contain at least one letter or digit"));
    }
    Ok(())
}

/// Slugs: 1..=100 chars of lowercase letters, digits and hyphens, no leading
/// or trailing hyphen.
pub fn slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.chars().count() > SLUG_MAX {
        return Err(invalid("slug", "must be between 1 and 100 characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "slug",
            "may only contain lowercase letters, digits and hyphens",
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(invalid("slug", "must not start or end with a hyphen"));
    }
    Ok(())
}

/// Titles: 1..=200 characters.
pub fn title(title: &str) -> Result<()> {
    if title.trim().is_empty() || title.chars().count() > TITLE_MAX {
        return Err(invalid("title", "must be between 1 and 200 characters"));
    }
    Ok(())
}

fn invalid(field: &'static str, message: &str) -> ServiceError {
    ServiceError::Validation {
        field,
        message: message.to_string(),
    }
}
