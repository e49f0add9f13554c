//! Marathon admin console library
//!
//! Client side of the marathon event administration console: the session,
//! the HTTP client and service seams, and the runners domain that keeps a
//! paged runner list consistent with live location events and optimistic
//! status edits.
//!
//! The `marathon-console` binary in `src/main.rs` is a thin CLI over these
//! modules; the library is exposed mainly so the domains can be driven from
//! tests with the in-memory stubs in [`infra::testing`].

pub mod app;
pub mod common;
pub mod domains;
pub mod infra;
