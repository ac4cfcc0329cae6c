use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // The charset the original frontend agreed on for user-entered text.
    static ref CLEAN_TEXT_RE: Regex = Regex::new(r"^[0-9a-zA-Z,?.! ]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Letters, digits, spaces and basic punctuation only. Empty is invalid.
pub fn is_clean_text(text: &str) -> bool {
    CLEAN_TEXT_RE.is_match(text)
}

/// At least 7 chars with one lowercase, one uppercase and two digits.
pub fn is_strong_password(password: &str) -> bool {
    let digits = password.chars().filter(|c| c.is_ascii_digit()).count();
    password.len() >= 7
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && digits >= 2
}

/// Helper for the inline handler checks: turns a failed predicate into the
/// 400-class error the responder renders.
pub fn require(ok: bool, message: &str) -> Result<(), ApiError> {
    if ok {
        Ok(())
    } else {
        Err(ApiError::Validation(message.into()))
    }
}
