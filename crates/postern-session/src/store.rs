//! In-memory access-credential store
//!
//! Holds the current short-lived bearer token for the life of the process.
//! There is no persistence: a restart means a fresh login or a cookie-backed
//! refresh. The store is the single source of truth for the credential; every
//! consumer shares one instance via `Arc` so a replacement performed by one
//! in-flight request pipeline is immediately visible to the next caller.
//!
//! Built on a `tokio::sync::watch` channel: reads clone the current value
//! under the channel's brief internal lock, writes are total replacements,
//! and `subscribe` hands out a receiver that wakes on every replacement.

use std::fmt;

use tokio::sync::watch;
use tracing::debug;

/// Shared cell for the current access credential.
///
/// Exactly one writer role exists conceptually (credential issuance: login,
/// verification success, refresh) and logout is the only clearer. Each write
/// replaces the whole value, so no transactional semantics are needed.
pub struct SessionStore {
    token: watch::Sender<Option<String>>,
}

impl SessionStore {
    /// Create an empty store (no credential held).
    pub fn new() -> Self {
        let (token, _) = watch::channel(None);
        Self { token }
    }

    /// Current access credential, if one is held.
    ///
    /// The value is current at call time, never a snapshot captured earlier.
    pub fn read(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    /// Replace the held credential, waking subscribers.
    pub fn write(&self, token: impl Into<String>) {
        let token = token.into();
        debug!(token_len = token.len(), "access credential replaced");
        self.token.send_replace(Some(token));
    }

    /// Drop the held credential, waking subscribers.
    pub fn clear(&self) {
        debug!("access credential cleared");
        self.token.send_replace(None);
    }

    /// Whether a credential is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// Receiver that observes every credential replacement.
    ///
    /// Consumers that must react to issuance or logout (a prompt, a UI
    /// layer) await `changed()` on this receiver.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// The token never appears in Debug output; log presence only.
impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held = if self.is_authenticated() {
            "[REDACTED]"
        } else {
            "<absent>"
        };
        f.debug_struct("SessionStore").field("token", &held).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn new_store_holds_nothing() {
        let store = SessionStore::new();
        assert!(store.read().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn write_then_read_returns_token() {
        let store = SessionStore::new();
        store.write("tok-1");
        assert_eq!(store.read().as_deref(), Some("tok-1"));
        assert!(store.is_authenticated());
    }

    #[test]
    fn write_replaces_previous_value() {
        let store = SessionStore::new();
        store.write("tok-1");
        store.write("tok-2");
        assert_eq!(store.read().as_deref(), Some("tok-2"));
    }

    #[test]
    fn clear_empties_store() {
        let store = SessionStore::new();
        store.write("tok-1");
        store.clear();
        assert!(store.read().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn shared_reference_sees_replacement() {
        let store = Arc::new(SessionStore::new());
        let reader = store.clone();
        store.write("tok-1");
        assert_eq!(reader.read().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn subscriber_wakes_on_write() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        store.write("tok-1");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn subscriber_wakes_on_clear() {
        let store = SessionStore::new();
        store.write("tok-1");
        let mut rx = store.subscribe();
        store.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn debug_never_prints_token() {
        let store = SessionStore::new();
        store.write("super-secret-token");
        let debug = format!("{store:?}");
        assert!(!debug.contains("super-secret-token"), "debug: {debug}");
        assert!(debug.contains("[REDACTED]"));
    }
}
