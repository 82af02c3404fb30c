//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Nigerian mobile numbers in local format, e.g. `08012345678`.
    static ref PHONE_NUMBER_REGEX: Regex = Regex::new(r"^0[789][01][0-9]{8}$").unwrap();
}

/// Validates a local-format Nigerian mobile number.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if PHONE_NUMBER_REGEX.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number_format");
        err.message = Some("Phone number must be a valid Nigerian mobile number".into());
        Err(err)
    }
}

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Rejects blank names and names carrying markup characters. Names are
/// quoted in outgoing mail.
pub fn validate_person_name(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;
    if value.contains(['<', '>']) {
        let mut err = ValidationError::new("name_characters");
        err.message = Some("Name must not contain < or >".into());
        return Err(err);
    }
    Ok(())
}

/// Trims and lowercases an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
