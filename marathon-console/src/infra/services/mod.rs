// Service seams between the domains and the HTTP client

pub mod api;
pub mod auth;
pub mod runners;

pub use api::{RunnerQuery, RunnerService};
pub use auth::{AuthApiAdapter, AuthService};
pub use runners::RunnerApiAdapter;
