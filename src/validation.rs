//! Field validators shared by request DTOs.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

/// Lower-case words separated by single hyphens, e.g. `salon-marrakech`.
pub static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("Slug may only contain lower-case letters, digits and hyphens".into());
        Err(err)
    }
}

pub fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount cannot be negative".into());
        Err(err)
    } else {
        Ok(())
    }
}
