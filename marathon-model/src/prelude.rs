//! Console-focused snapshot of the model surface.
//! Prefer importing from this module instead of individual tree nodes when
//! working in marathon-console or other presentation layers.

pub use super::error::{ModelError, Result as ModelResult};
pub use super::filters::{Pagination, RunnerFilters, RunnerPage};
pub use super::ids::{RunnerId, RunnerNumber};
pub use super::location_events::LocationEvent;
pub use super::runner::{GeoPoint, RunnerRecord, RunnerStatus};
