// Curated surface for console-facing code
pub use crate::api::routes::{utils as route_utils, v1};
pub use crate::api::types::{
    AdminUser, ApiResponse, EnvelopeError, LoginRequest, LoginResponse,
    UpdateRunnerRequest,
};
pub use marathon_model::prelude::*;
