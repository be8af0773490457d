//! Identity-service client: session lifecycle and the authenticated-request
//! pipeline
//!
//! Nothing here depends on the console binary; the whole credential flow
//! can be driven from tests.
//!
//! Credential flow:
//! 1. `api::ApiClient` talks to the backend; the HTTP-only refresh cookie
//!    rides in its cookie jar and never surfaces as a value.
//! 2. `login` / verification success writes the access credential into
//!    `postern_session::SessionStore`.
//! 3. `authed::AuthedClient` reads the store at dispatch time and attaches
//!    `Bearer <token>`; on an authorization failure it refreshes once
//!    through `refresh::Refresher` (single-flight) and replays once.
//! 4. `logout::logout` clears the store first, then revokes best-effort.
//! 5. `verify` drives the account-activation state machine, issuing the
//!    first credential for a fresh account.

pub mod api;
pub mod authed;
pub mod error;
pub mod logout;
pub mod refresh;
pub mod types;
pub mod validate;
pub mod verify;

pub use api::ApiClient;
pub use authed::{AuthedClient, PendingRequest};
pub use error::{Error, Result};
pub use logout::logout;
pub use refresh::Refresher;
pub use types::{AuthRequest, AuthResponse, Password, VerifyRequest};
pub use validate::FormError;
pub use verify::{VerifyAction, VerifyEvent, VerifyFlow, VerifyState, handle_event};
