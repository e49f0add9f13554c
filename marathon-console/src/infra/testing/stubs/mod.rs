pub mod auth;
pub mod runners;

pub use auth::StubAuthService;
pub use runners::{ListCall, StubRunnerService};
