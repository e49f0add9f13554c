pub mod api_client;
pub mod config;
pub mod errors;
pub mod services;
pub mod testing;

pub use api_client::ApiClient;
pub use config::ConsoleConfig;
pub use errors::{ConsoleError, ConsoleResult};
