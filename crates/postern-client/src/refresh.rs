//! Single-flight access token refresh
//!
//! Any number of tasks can hit an auth failure at the same moment; exactly
//! one refresh request may reach the backend for that moment. `Refresher`
//! funnels all callers through one `Flight`, and the leader writes the new
//! token into the session store before any waiter resumes. Waiters therefore
//! replay with the token already visible to every other reader of the store.

use std::sync::Arc;

use postern_session::{Flight, SessionStore};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::{Error, Result};

/// Coalesces concurrent refresh attempts into one backend call.
///
/// Clone-cheap via `Arc`; every clone shares the same flight slot, so one
/// `Refresher` per process gives the single-flight guarantee process-wide.
pub struct Refresher {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    flight: Flight<Result<String>>,
}

impl Refresher {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            flight: Flight::new(),
        }
    }

    /// Obtain a fresh access token, joining an in-flight refresh if one is
    /// already running.
    ///
    /// On success the session store already holds the returned token. On
    /// rejection the store is left untouched and every joined caller gets
    /// `SessionExpired`; transport faults stay `Transport` so callers can
    /// tell a dead network from a dead session.
    pub async fn refresh(&self) -> Result<String> {
        let api = Arc::clone(&self.api);
        let session = Arc::clone(&self.session);
        self.flight
            .run(move || async move {
                match api.refresh().await {
                    Ok(token) => {
                        // Store first: waiters must observe the token the
                        // moment they resume
                        session.write(token.clone());
                        debug!("access token refreshed");
                        Ok(token)
                    }
                    Err(e) => {
                        warn!(error = %e, "token refresh failed");
                        Err(e)
                    }
                }
            })
            .await
    }

    /// Whether the session store currently holds a token.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("base_url", &self.api.base_url())
            .field("session", &self.session)
            .finish()
    }
}
