//! Client-side form validation
//!
//! Runs before any network call; nothing here performs I/O. Failures are
//! field-level and scoped to a single submission attempt. The backend does
//! its own validation too, so these checks only have to catch what a user
//! can mistype, not enforce the full account policy.

use regex::Regex;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 7;

/// A single-field validation failure, surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least 7 characters")]
    PasswordTooShort,

    #[error("verification code must be exactly six digits")]
    InvalidCode,
}

impl From<FormError> for crate::error::Error {
    fn from(err: FormError) -> Self {
        crate::error::Error::Validation(err.to_string())
    }
}

/// Lightweight email sanity check used before register and login.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Password length check; the backend owns every stronger policy.
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Validate a credential pair, reporting the first failing field.
pub fn check_credentials(email: &str, password: &str) -> std::result::Result<(), FormError> {
    if !valid_email(email) {
        return Err(FormError::InvalidEmail);
    }
    if !valid_password(password) {
        return Err(FormError::PasswordTooShort);
    }
    Ok(())
}

/// Parse a verification-code entry. The backend issues six-digit codes, so
/// anything else is rejected before the wire.
pub fn parse_verification_code(input: &str) -> std::result::Result<u32, FormError> {
    let trimmed = input.trim();
    if trimmed.len() != 6 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormError::InvalidCode);
    }
    trimmed.parse().map_err(|_| FormError::InvalidCode)
}
