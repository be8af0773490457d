//! Authenticated request pipeline
//!
//! Every request that needs a bearer credential goes through
//! `AuthedClient::execute`. The credential is read from the session store at
//! dispatch time, not at request-build time, so a request built before a
//! refresh still dispatches with the newest token. On an auth failure the
//! pipeline refreshes once (single-flight across tasks) and replays the
//! request with the refreshed token pinned; a second auth failure is final.

use std::sync::Arc;

use postern_session::SessionStore;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::{Error, Result, classify_status, is_auth_failure};
use crate::refresh::Refresher;

/// A request that has not been dispatched yet.
///
/// Carries everything needed to (re)send it: the credential slot stays
/// empty unless the caller overrides it, and `retried` records whether the
/// one permitted refresh-replay has been spent. The flag travels with the
/// value, so replays never mutate state shared with other requests.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: reqwest::Method,
    path: String,
    body: Option<serde_json::Value>,
    authorization: Option<String>,
    retried: bool,
}

impl PendingRequest {
    pub fn new(method: reqwest::Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            authorization: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(reqwest::Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(reqwest::Method::POST, path);
        request.body = Some(body);
        request
    }

    /// Pin a specific bearer token instead of reading the session store at
    /// dispatch time.
    pub fn with_authorization(mut self, token: impl Into<String>) -> Self {
        self.authorization = Some(token.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Dispatches requests with the session credential and transparent refresh.
pub struct AuthedClient {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    refresher: Arc<Refresher>,
}

impl AuthedClient {
    /// The refresher is shared, not owned: hand every `AuthedClient` in the
    /// process the same one so concurrent auth failures coalesce into a
    /// single refresh.
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionStore>,
        refresher: Arc<Refresher>,
    ) -> Self {
        Self {
            api,
            session,
            refresher,
        }
    }

    /// Dispatch a request, refreshing and replaying once on auth failure.
    ///
    /// An empty session store dispatches anonymously; the backend's
    /// rejection then drives the same refresh path, which recovers the
    /// session when the refresh cookie is still good. `SessionExpired` from
    /// the refresher propagates as-is so callers can route to login.
    pub async fn execute(&self, mut request: PendingRequest) -> Result<reqwest::Response> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());

        loop {
            let token = match &request.authorization {
                Some(token) => Some(token.clone()),
                None => self.session.read(),
            };

            debug!(
                request_id = %request_id,
                method = %request.method,
                path = %request.path,
                retried = request.retried,
                "dispatching"
            );
            let response = self.dispatch(&request, token.as_deref()).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if is_auth_failure(status) {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<no body>"));

                if request.retried {
                    warn!(request_id = %request_id, status = %status, "rejected again after refresh");
                    return Err(Error::Authentication(format!(
                        "request rejected after refresh ({status}): {body}"
                    )));
                }

                debug!(request_id = %request_id, status = %status, "auth failure, refreshing");
                let token = self.refresher.refresh().await?;

                // Pin the refreshed token for the replay. Reading the store
                // again could race a concurrent clear and loop us into a
                // second refresh.
                request.authorization = Some(token);
                request.retried = true;
                continue;
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(classify_status(status, &body));
        }
    }

    /// Execute and read the body as text. Small convenience for endpoints
    /// with plain-text responses.
    pub async fn get_text(&self, path: impl Into<String>) -> Result<String> {
        let response = self.execute(PendingRequest::get(path)).await?;
        response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("reading response body: {e}")))
    }

    async fn dispatch(
        &self,
        request: &PendingRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .api
            .http()
            .request(request.method.clone(), self.api.url(&request.path));

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("request to {} failed: {e}", request.path)))
    }
}

impl std::fmt::Debug for AuthedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthedClient")
            .field("base_url", &self.api.base_url())
            .field("session", &self.session)
            .finish()
    }
}
