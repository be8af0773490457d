//! Account verification flow
//!
//! The flow is split into a pure state machine and a driver. `handle_event`
//! owns every transition decision and performs no I/O, which keeps the whole
//! decision table testable without a backend. `VerifyFlow` wraps it with the
//! actual HTTP calls and the session store write on activation.
//!
//! State shape:
//!   Loading      → status fetch in progress
//!   AlreadyEnabled → terminal; activation is not offered again
//!   PendingInput → waiting for a code (holds last error, resend marker)
//!   Submitting   → code submission in progress
//!   Activated    → terminal; credential stored

use std::sync::Arc;

use postern_session::SessionStore;
use tracing::debug;

use crate::api::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyState {
    Loading,
    AlreadyEnabled,
    PendingInput {
        error: Option<String>,
        code_resent: bool,
    },
    Submitting {
        code_resent: bool,
    },
    Activated,
}

#[derive(Debug, Clone)]
pub enum VerifyEvent {
    StatusFetched { enabled: bool },
    StatusFetchFailed { message: String },
    SubmitRequested { code: u32 },
    SubmitSucceeded { access_token: String },
    SubmitFailed { message: String },
    ResendRequested,
    ResendSucceeded,
    ResendFailed { message: String },
}

/// What the driver must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyAction {
    FetchStatus,
    SubmitCode { code: u32 },
    ResendCode,
    StoreCredential { access_token: String },
    None,
}

/// Entry point: the flow starts by checking whether the subject is already
/// enabled.
pub fn start() -> (VerifyState, VerifyAction) {
    (VerifyState::Loading, VerifyAction::FetchStatus)
}

/// Advance the machine by one event.
///
/// Events that make no sense for the current state are dropped: the state
/// is returned unchanged with no action. A submit error stays visible
/// through a resend and clears on the next submit attempt.
pub fn handle_event(state: VerifyState, event: VerifyEvent) -> (VerifyState, VerifyAction) {
    use VerifyAction as Action;
    use VerifyEvent as Event;
    use VerifyState as State;

    match (state, event) {
        (State::Loading, Event::StatusFetched { enabled: true }) => {
            (State::AlreadyEnabled, Action::None)
        }
        (State::Loading, Event::StatusFetched { enabled: false }) => (
            State::PendingInput {
                error: None,
                code_resent: false,
            },
            Action::None,
        ),
        // A failed status check still lets the subject try a code; the
        // failure is shown alongside the input
        (State::Loading, Event::StatusFetchFailed { message }) => (
            State::PendingInput {
                error: Some(message),
                code_resent: false,
            },
            Action::None,
        ),
        (State::PendingInput { code_resent, .. }, Event::SubmitRequested { code }) => {
            (State::Submitting { code_resent }, Action::SubmitCode { code })
        }
        (State::Submitting { .. }, Event::SubmitSucceeded { access_token }) => {
            (State::Activated, Action::StoreCredential { access_token })
        }
        (State::Submitting { code_resent }, Event::SubmitFailed { message }) => (
            State::PendingInput {
                error: Some(message),
                code_resent,
            },
            Action::None,
        ),
        (State::PendingInput { error, code_resent }, Event::ResendRequested) => (
            State::PendingInput { error, code_resent },
            Action::ResendCode,
        ),
        (State::PendingInput { error, .. }, Event::ResendSucceeded) => (
            State::PendingInput {
                error,
                code_resent: true,
            },
            Action::None,
        ),
        (State::PendingInput { code_resent, .. }, Event::ResendFailed { message }) => (
            State::PendingInput {
                error: Some(message),
                code_resent,
            },
            Action::None,
        ),
        // Activation is not offered for an already-enabled subject
        (State::AlreadyEnabled, Event::SubmitRequested { .. }) => {
            (State::AlreadyEnabled, Action::None)
        }
        (state, _event) => (state, Action::None),
    }
}

/// Drives the verification machine against the backend for one subject.
pub struct VerifyFlow {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    subject_id: String,
    state: VerifyState,
}

impl VerifyFlow {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionStore>, subject_id: impl Into<String>) -> Self {
        Self {
            api,
            session,
            subject_id: subject_id.into(),
            state: VerifyState::Loading,
        }
    }

    pub fn state(&self) -> &VerifyState {
        &self.state
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Fetch the enablement status and settle into the first interactive
    /// state.
    pub async fn load(&mut self) {
        let (state, action) = start();
        self.state = state;
        self.drive(action).await;
    }

    /// Submit a verification code.
    pub async fn submit(&mut self, code: u32) {
        self.apply(VerifyEvent::SubmitRequested { code }).await;
    }

    /// Ask for a fresh code.
    pub async fn resend(&mut self) {
        self.apply(VerifyEvent::ResendRequested).await;
    }

    async fn apply(&mut self, event: VerifyEvent) {
        let (state, action) = handle_event(self.state.clone(), event);
        self.state = state;
        self.drive(action).await;
    }

    /// Interpret actions until the machine settles. Each I/O result is fed
    /// back as an event, which may emit a follow-up action.
    async fn drive(&mut self, mut action: VerifyAction) {
        loop {
            match action {
                VerifyAction::None => return,
                VerifyAction::FetchStatus => {
                    let event = match self.api.check_verification(&self.subject_id).await {
                        Ok(enabled) => VerifyEvent::StatusFetched { enabled },
                        Err(e) => VerifyEvent::StatusFetchFailed {
                            message: e.to_string(),
                        },
                    };
                    action = self.step(event);
                }
                VerifyAction::SubmitCode { code } => {
                    let event = match self
                        .api
                        .submit_verification_code(&self.subject_id, code)
                        .await
                    {
                        Ok(auth) => VerifyEvent::SubmitSucceeded {
                            access_token: auth.access_token,
                        },
                        Err(e) => VerifyEvent::SubmitFailed {
                            message: e.to_string(),
                        },
                    };
                    action = self.step(event);
                }
                VerifyAction::ResendCode => {
                    let event = match self.api.resend_verification_code(&self.subject_id).await {
                        Ok(()) => VerifyEvent::ResendSucceeded,
                        Err(e) => VerifyEvent::ResendFailed {
                            message: e.to_string(),
                        },
                    };
                    action = self.step(event);
                }
                VerifyAction::StoreCredential { access_token } => {
                    self.session.write(access_token);
                    debug!(subject_id = %self.subject_id, "account activated, credential stored");
                    return;
                }
            }
        }
    }

    fn step(&mut self, event: VerifyEvent) -> VerifyAction {
        let (state, action) = handle_event(self.state.clone(), event);
        self.state = state;
        action
    }
}
