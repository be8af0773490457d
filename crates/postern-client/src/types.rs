//! Wire types for the identity service
//!
//! The backend speaks camelCase JSON. One response shape covers login,
//! verification success, and refresh; refresh omits the account fields, so
//! they are optional.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Password material - redacted in Debug/Display, zeroized on drop.
///
/// Serializes as a plain string so request bodies carry the real value;
/// everything else sees `[REDACTED]`.
#[derive(Serialize)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Clone for Password {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Registration and login request body.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: Password,
}

/// Credential issuance response for login, verification success, and
/// refresh.
///
/// `user_email` and `role` are echoed by login and verification; refresh
/// returns the access token alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Verification-code submission body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub verification_code: u32,
}
