//! API-facing facade (transport DTOs, routes, live event names).

pub mod routes;
pub mod types;
