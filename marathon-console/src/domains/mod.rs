pub mod auth;
pub mod runners;
