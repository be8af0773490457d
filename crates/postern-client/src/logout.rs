//! Session teardown
//!
//! Logout must always leave the process unauthenticated, even when the
//! backend is unreachable. The local clear happens first and
//! unconditionally; revoking the refresh credential on the backend is best
//! effort.

use postern_session::SessionStore;
use tracing::{debug, warn};

use crate::api::ApiClient;

/// End the session.
///
/// Clears the session store, then asks the backend to revoke the refresh
/// credential. A failed revocation is logged and swallowed; the process is
/// unauthenticated either way.
pub async fn logout(api: &ApiClient, session: &SessionStore) {
    session.clear();

    if let Err(e) = api.logout().await {
        warn!(error = %e, "backend logout failed, session cleared locally");
    } else {
        debug!("logged out");
    }
}
