//! Field validators used by `#[validate(custom(...))]` on request schemas

use chrono::{Datelike, Utc};
use std::borrow::Cow;
use validator::{ValidateUrl, ValidationError};

/// Minimum portfolio slug length
pub const SLUG_MIN_LEN: usize = 3;

/// Maximum portfolio slug length
pub const SLUG_MAX_LEN: usize = 50;

/// Earliest accepted graduation year
pub const MIN_GRADUATION_YEAR: i32 = 1900;

/// How far into the future a graduation year may lie
pub const GRADUATION_YEARS_AHEAD: i32 = 10;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Portfolio slug: 3 to 50 characters of `[a-z0-9-]`
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let len = slug.chars().count();
    if !(SLUG_MIN_LEN..=SLUG_MAX_LEN).contains(&len) {
        return Err(error(
            "slug_length",
            "Portfolio slug must be 3-50 characters",
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(error(
            "slug_format",
            "Portfolio slug may only contain lowercase letters, numbers and hyphens",
        ));
    }
    Ok(())
}

/// Hex color: `#RRGGBB`, either case
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(error("hex_color", "Color must be a hex value like #2563eb"))
    }
}

/// Graduation year between 1900 and ten years from now
pub fn validate_graduation_year(year: i32) -> Result<(), ValidationError> {
    let max = Utc::now().year() + GRADUATION_YEARS_AHEAD;
    if (MIN_GRADUATION_YEAR..=max).contains(&year) {
        Ok(())
    } else {
        Err(error(
            "graduation_year",
            "Graduation year must be between 1900 and ten years from now",
        ))
    }
}

/// Every entry must be a valid URL
pub fn validate_url_list(urls: &[String]) -> Result<(), ValidationError> {
    if urls.iter().all(|url| url.validate_url()) {
        Ok(())
    } else {
        Err(error("url", "Every entry must be a valid URL"))
    }
}
