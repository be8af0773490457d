//! HTTP accessor for the identity service
//!
//! Thin wrapper over reqwest bound to one base URL. Nothing here attaches a
//! bearer credential; authenticated traffic goes through
//! `authed::AuthedClient`. The underlying client keeps a cookie jar so the
//! transport carries the HTTP-only refresh cookie on credentialed endpoints
//! (refresh, logout) without the cookie's value ever surfacing to
//! application code.
//!
//! Callers own credential placement: login and verification return the
//! issued token, and whoever drives the flow writes it into the session
//! store.

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result, classify_status, is_auth_failure};
use crate::types::{AuthRequest, AuthResponse, Password, VerifyRequest};
use crate::validate;

/// Identity-service accessor with a cookie jar for the refresh credential.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client against the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// The configured backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Join a path onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Create an account. The backend delivers the verification code out of
    /// band; the new account stays disabled until verified.
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        validate::check_credentials(email, password)?;
        let response = self
            .http
            .post(self.url("/v1/auth/register"))
            .json(&AuthRequest {
                email: email.to_string(),
                password: Password::new(password),
            })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("register request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(classify_status(status, &body));
        }

        debug!(email, "registration submitted");
        Ok(())
    }

    /// Exchange credentials for an access token.
    ///
    /// On success the backend also sets the HTTP-only refresh cookie on this
    /// client's jar; later `refresh` calls ride on it.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        validate::check_credentials(email, password)?;
        let response = self
            .http
            .post(self.url("/v1/auth/login"))
            .json(&AuthRequest {
                email: email.to_string(),
                password: Password::new(password),
            })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(classify_status(status, &body));
        }

        let auth = response
            .json::<AuthResponse>()
            .await
            .map_err(|e| Error::Transport(format!("invalid login response: {e}")))?;
        debug!(email, "login accepted");
        Ok(auth)
    }

    /// Whether the subject's account is already enabled.
    ///
    /// Unknown subjects report `false`; the backend does not distinguish
    /// them from known-but-unverified accounts.
    pub async fn check_verification(&self, subject_id: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.url("/v1/auth/userEnabled"))
            .query(&[("id", subject_id)])
            .send()
            .await
            .map_err(|e| Error::Transport(format!("verification status request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(classify_status(status, &body));
        }

        response
            .json::<bool>()
            .await
            .map_err(|e| Error::Transport(format!("invalid verification status response: {e}")))
    }

    /// Submit a verification code for the subject.
    ///
    /// Success activates the account and issues its first access token. A
    /// wrong or expired code comes back as `Validation`.
    pub async fn submit_verification_code(
        &self,
        subject_id: &str,
        code: u32,
    ) -> Result<AuthResponse> {
        let response = self
            .http
            .post(self.url("/v1/auth/verify"))
            .query(&[("id", subject_id)])
            .json(&VerifyRequest {
                verification_code: code,
            })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("verify request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(classify_status(status, &body));
        }

        let auth = response
            .json::<AuthResponse>()
            .await
            .map_err(|e| Error::Transport(format!("invalid verify response: {e}")))?;
        debug!(subject_id, "verification code accepted");
        Ok(auth)
    }

    /// Ask the backend to send a fresh verification code.
    pub async fn resend_verification_code(&self, subject_id: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/v1/auth/resendVerification"))
            .query(&[("id", subject_id)])
            .send()
            .await
            .map_err(|e| Error::Transport(format!("resend request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(classify_status(status, &body));
        }

        debug!(subject_id, "verification code resent");
        Ok(())
    }

    /// Mint a new access token from the refresh cookie.
    ///
    /// The request carries no bearer credential; the cookie jar supplies the
    /// refresh credential. Rejection condemns that credential and maps to
    /// `SessionExpired`, while transport faults say nothing about the
    /// session.
    pub async fn refresh(&self) -> Result<String> {
        let response = self
            .http
            .get(self.url("/v1/auth/refresh-token"))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));

            // 401/403 means the refresh credential itself is no good
            if is_auth_failure(status) {
                return Err(Error::SessionExpired(format!(
                    "refresh rejected ({status}): {body}"
                )));
            }

            return Err(classify_status(status, &body));
        }

        let auth = response
            .json::<AuthResponse>()
            .await
            .map_err(|e| Error::Transport(format!("invalid refresh response: {e}")))?;
        Ok(auth.access_token)
    }

    /// Ask the backend to revoke the refresh credential.
    ///
    /// Callers treat failure as non-fatal; see `logout::logout`.
    pub async fn logout(&self) -> Result<()> {
        let response = self
            .http
            .post(self.url("/v1/auth/logout"))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("logout request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(classify_status(status, &body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = test_client("http://127.0.0.1:8080/");
        assert_eq!(
            client.url("/v1/auth/login"),
            "http://127.0.0.1:8080/v1/auth/login"
        );

        let client = test_client("http://127.0.0.1:8080");
        assert_eq!(
            client.url("/v1/auth/login"),
            "http://127.0.0.1:8080/v1/auth/login"
        );
    }

    #[tokio::test]
    async fn register_rejects_bad_email_before_dispatch() {
        // Unroutable base URL: a network attempt would fail differently
        let client = test_client("http://127.0.0.1:1");
        let err = client.register("not-an-email", "pw1234567").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got: {err:?}");
        assert!(err.to_string().contains("email"), "got: {err}");
    }

    #[tokio::test]
    async fn login_rejects_short_password_before_dispatch() {
        let client = test_client("http://127.0.0.1:1");
        let err = client.login("user@example.com", "short").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got: {err:?}");
        assert!(err.to_string().contains("7 characters"), "got: {err}");
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let client = test_client("http://127.0.0.1:1");
        let err = client.check_verification("subj-1").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    }
}
