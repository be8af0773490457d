//! Session state shared across the identity client
//!
//! Two pieces live here, both free of any HTTP dependency:
//! - `store::SessionStore`: the in-memory cell holding the current access
//!   credential, shared by reference across every consumer in the process.
//! - `flight::Flight`: a single-flight primitive that coalesces concurrent
//!   executions of one logical async operation onto a shared future.
//!
//! The client crate composes the two: the credential refresh runs inside a
//! `Flight` and writes the `SessionStore` before any waiter resumes.

pub mod flight;
pub mod store;

pub use flight::Flight;
pub use store::SessionStore;
