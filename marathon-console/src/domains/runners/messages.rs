use super::detail::RunnerDetail;
use super::live_feed::SubscriptionId;
use super::reconciler::{FetchTicket, StatusEditTicket};
use crate::infra::errors::{ConsoleError, ConsoleResult};

use marathon_core::console_prelude::{
    GeoPoint, LocationEvent, RunnerFilters, RunnerId, RunnerPage, RunnerRecord,
    RunnerStatus,
};
use std::path::PathBuf;

#[derive(Debug)]
pub enum RunnersMessage {
    // Lifecycle
    /// Subscribe to the live feed and load the current page
    Mount,
    /// Release the live subscription
    Unmount,
    /// Stop the controller loop
    Shutdown,

    // List
    SetFilters(RunnerFilters),
    FetchPage {
        page: u32,
        limit: Option<u32>,
    },
    NextPage,
    PreviousPage,
    Retry,
    DismissError,
    PageLoaded {
        ticket: FetchTicket,
        result: ConsoleResult<RunnerPage>,
    },

    // Status edits
    SetStatus {
        runner_id: RunnerId,
        status: RunnerStatus,
    },
    ToggleStatus(RunnerId),
    DismissEditError,
    StatusSaved {
        ticket: StatusEditTicket,
        result: ConsoleResult<RunnerRecord>,
    },

    // Live feed
    LocationReceived {
        subscription: SubscriptionId,
        event: LocationEvent,
    },
    LiveFeedClosed(SubscriptionId),

    // Detail view
    OpenDetail(RunnerId),
    RefreshDetail,
    CloseDetail,
    DetailLoaded {
        runner_id: RunnerId,
        result: ConsoleResult<RunnerRecord>,
    },

    // Export
    Export(Option<PathBuf>),
    ExportFinished(ConsoleResult<PathBuf>),
}

impl RunnersMessage {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mount => "Runners::Mount",
            Self::Unmount => "Runners::Unmount",
            Self::Shutdown => "Runners::Shutdown",
            Self::SetFilters(_) => "Runners::SetFilters",
            Self::FetchPage { .. } => "Runners::FetchPage",
            Self::NextPage => "Runners::NextPage",
            Self::PreviousPage => "Runners::PreviousPage",
            Self::Retry => "Runners::Retry",
            Self::DismissError => "Runners::DismissError",
            Self::PageLoaded { .. } => "Runners::PageLoaded",
            Self::SetStatus { .. } => "Runners::SetStatus",
            Self::ToggleStatus(_) => "Runners::ToggleStatus",
            Self::DismissEditError => "Runners::DismissEditError",
            Self::StatusSaved { .. } => "Runners::StatusSaved",
            Self::LocationReceived { .. } => "Runners::LocationReceived",
            Self::LiveFeedClosed(_) => "Runners::LiveFeedClosed",
            Self::OpenDetail(_) => "Runners::OpenDetail",
            Self::RefreshDetail => "Runners::RefreshDetail",
            Self::CloseDetail => "Runners::CloseDetail",
            Self::DetailLoaded { .. } => "Runners::DetailLoaded",
            Self::Export(_) => "Runners::Export",
            Self::ExportFinished(_) => "Runners::ExportFinished",
        }
    }
}

/// Notifications for whoever is presenting the runners view
#[derive(Debug, Clone, PartialEq)]
pub enum RunnersEvent {
    PageLoaded {
        page: u32,
        total_pages: u32,
        total: u64,
        shown: usize,
    },
    FetchFailed(ConsoleError),
    RunnerMoved {
        runner_id: RunnerId,
        location: GeoPoint,
        status: Option<RunnerStatus>,
    },
    StatusConfirmed {
        runner_id: RunnerId,
        status: RunnerStatus,
    },
    StatusRolledBack {
        runner_id: RunnerId,
        status: RunnerStatus,
        error: ConsoleError,
    },
    /// Edit failed after a newer edit or a refresh made rolling back wrong
    StatusEditFailed {
        runner_id: RunnerId,
        error: ConsoleError,
    },
    /// Edit requested for a runner that is not on the current page
    StatusEditIgnored(RunnerId),
    DetailReady(RunnerDetail),
    DetailFailed {
        runner_id: RunnerId,
        error: ConsoleError,
    },
    ExportReady(PathBuf),
    ExportFailed(ConsoleError),
    FeedClosed,
    /// The server rejected the session; reported once per session
    SessionExpired,
}
