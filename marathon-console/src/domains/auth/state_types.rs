//! Session state management with a proper state machine
//!
//! The console has exactly one session, created at startup and handed to
//! every component that needs the bearer token. Observers follow changes
//! through a watch channel instead of polling shared mutable state.

use marathon_core::api::types::AdminUser;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Bearer token issued by `POST /auth/login`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Arc<str>);

impl AuthToken {
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        AuthToken(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Session state machine
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    /// No token
    #[default]
    Unauthenticated,

    /// Token accepted, account details not loaded yet
    Pending { token: AuthToken },

    /// Token and account both known
    Authenticated { user: AdminUser, token: AuthToken },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&AuthToken> {
        match self {
            AuthState::Pending { token }
            | AuthState::Authenticated { token, .. } => Some(token),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn user(&self) -> Option<&AdminUser> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }
}

/// Shared session handle backed by a watch channel
#[derive(Clone, Debug)]
pub struct SessionStore {
    sender: Arc<watch::Sender<AuthState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(AuthState::Unauthenticated);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current state
    pub fn current(&self) -> AuthState {
        self.sender.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_authenticated()
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.sender.borrow().token().cloned()
    }

    pub fn current_user(&self) -> Option<AdminUser> {
        self.sender.borrow().user().cloned()
    }

    pub fn set(&self, state: AuthState) {
        self.sender.send_replace(state);
    }

    /// Drop the session after the server rejected the token.
    ///
    /// Returns `true` only for the call that actually ended a live session,
    /// so concurrent 401s are reported once.
    pub fn invalidate(&self) -> bool {
        self.sender.send_if_modified(|state| {
            if matches!(state, AuthState::Unauthenticated) {
                return false;
            }
            *state = AuthState::Unauthenticated;
            true
        })
    }

    /// Follow state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }
}
