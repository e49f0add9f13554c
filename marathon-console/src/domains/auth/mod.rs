//! Authentication domain
//!
//! One in-memory session per process, injected wherever a token is needed.

pub mod manager;
pub mod state_types;

pub use manager::SessionManager;
pub use state_types::{AuthState, AuthToken, SessionStore};
