//! Core data model definitions shared across the marathon console crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod filters;
pub mod ids;
pub mod location_events;
pub mod prelude;
pub mod runner;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use filters::{Pagination, RunnerFilters, RunnerPage};
pub use ids::{RunnerId, RunnerNumber};
pub use location_events::LocationEvent;
pub use runner::{GeoPoint, RunnerRecord, RunnerStatus};
