//! Error taxonomy for identity-service operations
//!
//! One enum covers the whole client surface. Variants are `Clone` because a
//! coalesced refresh hands the same failure to every waiter. Classification
//! from an HTTP status lives in `classify_status` so the mapping exists in
//! exactly one place.

/// Errors surfaced by the identity client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Malformed input, caught client-side or rejected by the backend.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Bad credentials, or an authorization failure that survived the
    /// refresh-and-replay cycle.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The refresh credential is missing, expired, or revoked. Callers
    /// treat this as logged out.
    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Network or decode failure; worth retrying, says nothing about the
    /// session.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result alias for identity-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Whether a status signals an authorization failure.
///
/// The deployed backend answers 403 for an expired or invalid bearer
/// credential; 401 is the conventional status for the same condition. The
/// pipeline accepts both as the refresh trigger.
pub fn is_auth_failure(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 401 || status.as_u16() == 403
}

/// Classify a non-success backend response by status and body.
pub fn classify_status(status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        400 | 422 => Error::Validation(format!("rejected ({status}): {body}")),
        401 | 403 => Error::Authentication(format!("rejected ({status}): {body}")),
        404 => Error::NotFound(format!("rejected ({status}): {body}")),
        409 => Error::Conflict(format!("rejected ({status}): {body}")),
        429 => Error::RateLimit(format!("rejected ({status}): {body}")),
        _ => Error::Transport(format!("unexpected status {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn classify_400_is_validation() {
        let err = classify_status(StatusCode::BAD_REQUEST, "bad email");
        assert!(matches!(err, Error::Validation(_)), "got: {err:?}");
    }

    #[test]
    fn classify_422_is_validation() {
        let err = classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad field");
        assert!(matches!(err, Error::Validation(_)), "got: {err:?}");
    }

    #[test]
    fn classify_401_is_authentication() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "no token");
        assert!(matches!(err, Error::Authentication(_)), "got: {err:?}");
    }

    #[test]
    fn classify_403_is_authentication() {
        let err = classify_status(StatusCode::FORBIDDEN, "expired token");
        assert!(matches!(err, Error::Authentication(_)), "got: {err:?}");
    }

    #[test]
    fn classify_404_is_not_found() {
        let err = classify_status(StatusCode::NOT_FOUND, "no such subject");
        assert!(matches!(err, Error::NotFound(_)), "got: {err:?}");
    }

    #[test]
    fn classify_409_is_conflict() {
        let err = classify_status(StatusCode::CONFLICT, "email taken");
        assert!(matches!(err, Error::Conflict(_)), "got: {err:?}");
    }

    #[test]
    fn classify_429_is_rate_limit() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(err, Error::RateLimit(_)), "got: {err:?}");
    }

    #[test]
    fn classify_500_is_transport() {
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    }

    #[test]
    fn auth_failure_statuses() {
        assert!(is_auth_failure(StatusCode::UNAUTHORIZED));
        assert!(is_auth_failure(StatusCode::FORBIDDEN));
        assert!(!is_auth_failure(StatusCode::BAD_REQUEST));
        assert!(!is_auth_failure(StatusCode::NOT_FOUND));
        assert!(!is_auth_failure(StatusCode::OK));
    }

    #[test]
    fn display_includes_detail() {
        let err = Error::SessionExpired("refresh rejected (403): gone".into());
        assert_eq!(
            err.to_string(),
            "session expired: refresh rejected (403): gone"
        );

        let err = Error::Transport("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn errors_are_cloneable() {
        let err = Error::Authentication("bad password".into());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
