//! Runner management domain
//!
//! Holds the displayed runner list and everything that changes it: paged
//! fetches, live location events and optimistic status edits.

pub mod controller;
pub mod detail;
pub mod export;
pub mod journal;
pub mod live_feed;
pub mod messages;
pub mod reconciler;
pub mod update;

pub use controller::{RunnersController, RunnersHandle};
pub use detail::RunnerDetail;
pub use messages::{RunnersEvent, RunnersMessage};
pub use reconciler::{FetchState, RunnerListReconciler};

use self::journal::EventJournal;
use self::live_feed::{LiveLocationFeed, LocationSubscription};
use crate::infra::config::ConsoleConfig;
use crate::infra::errors::ConsoleError;
use crate::infra::services::api::RunnerService;

use marathon_core::console_prelude::{
    Pagination, RunnerFilters, RunnerId, RunnerRecord,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Runners domain state, owned by the controller task
#[derive(Debug)]
pub struct RunnersDomainState {
    pub reconciler: RunnerListReconciler,
    pub detail: Option<RunnerDetail>,
    /// Runner whose detail view is open or being loaded
    pub detail_target: Option<RunnerId>,
    pub live: Option<LocationSubscription>,
    pub export_dir: PathBuf,

    // Shared references needed by the runners domain
    pub service: Arc<dyn RunnerService>,
    pub feed: Arc<dyn LiveLocationFeed>,
}

impl RunnersDomainState {
    pub fn new(
        service: Arc<dyn RunnerService>,
        feed: Arc<dyn LiveLocationFeed>,
        config: &ConsoleConfig,
    ) -> Self {
        Self {
            reconciler: RunnerListReconciler::new(
                config.page_limit,
                EventJournal::with_capacity(config.event_journal_capacity),
            ),
            detail: None,
            detail_target: None,
            live: None,
            export_dir: config.export_dir_or_cwd(),
            service,
            feed,
        }
    }

    pub fn snapshot(&self) -> RunnersSnapshot {
        RunnersSnapshot {
            records: self.reconciler.records().to_vec(),
            fetch_state: self.reconciler.fetch_state(),
            pagination: self.reconciler.pagination(),
            filters: self.reconciler.filters().clone(),
            live: self.reconciler.subscription().is_some(),
            last_error: self.reconciler.last_error().cloned(),
            last_edit_error: self.reconciler.last_edit_error().cloned(),
            detail: self.detail.clone(),
        }
    }
}

/// Read-only copy of what the runners view shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnersSnapshot {
    pub records: Vec<RunnerRecord>,
    pub fetch_state: FetchState,
    pub pagination: Pagination,
    pub filters: RunnerFilters,
    pub live: bool,
    pub last_error: Option<ConsoleError>,
    pub last_edit_error: Option<ConsoleError>,
    pub detail: Option<RunnerDetail>,
}

impl RunnersSnapshot {
    pub fn record(&self, id: &RunnerId) -> Option<&RunnerRecord> {
        self.records.iter().find(|record| &record.id == id)
    }
}
