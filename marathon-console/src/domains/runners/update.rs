use super::RunnersDomainState;
use super::detail::RunnerDetail;
use super::export;
use super::messages::{RunnersEvent, RunnersMessage};
use super::reconciler::{
    FetchOutcome, FetchTicket, LocationOutcome, StatusEditTicket,
    StatusOutcome,
};
use crate::common::Task;
use crate::infra::errors::ConsoleResult;

use marathon_core::console_prelude::{
    RunnerId, RunnerPage, RunnerRecord, RunnerStatus, UpdateRunnerRequest,
};
use marathon_model::chrono::Utc;

/// Result of a runners update: follow-up work plus notifications
#[derive(Debug, Default)]
pub struct RunnersUpdate {
    pub task: Task<RunnersMessage>,
    pub events: Vec<RunnersEvent>,
}

impl RunnersUpdate {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn task(task: Task<RunnersMessage>) -> Self {
        Self {
            task,
            events: Vec::new(),
        }
    }

    pub fn event(event: RunnersEvent) -> Self {
        Self {
            task: Task::none(),
            events: vec![event],
        }
    }

    fn with_event(mut self, event: RunnersEvent) -> Self {
        self.events.push(event);
        self
    }
}

pub fn update_runners(
    state: &mut RunnersDomainState,
    message: RunnersMessage,
) -> RunnersUpdate {
    log::trace!("[Runners] {}", message.name());

    match message {
        RunnersMessage::Mount => handle_mount(state),
        RunnersMessage::Unmount => {
            handle_unmount(state);
            RunnersUpdate::none()
        }
        // Consumed by the controller loop before it gets here
        RunnersMessage::Shutdown => RunnersUpdate::none(),

        RunnersMessage::SetFilters(filters) => {
            let ticket = state.reconciler.set_filters(filters);
            RunnersUpdate::task(fetch_task(state, ticket))
        }
        RunnersMessage::FetchPage { page, limit } => {
            let limit = limit.unwrap_or(state.reconciler.pagination().limit);
            let ticket = state.reconciler.fetch_page(page, limit);
            RunnersUpdate::task(fetch_task(state, ticket))
        }
        RunnersMessage::NextPage => {
            let ticket = state.reconciler.next_page();
            optional_fetch(state, ticket)
        }
        RunnersMessage::PreviousPage => {
            let ticket = state.reconciler.previous_page();
            optional_fetch(state, ticket)
        }
        RunnersMessage::Retry => {
            let ticket = state.reconciler.retry();
            optional_fetch(state, ticket)
        }
        RunnersMessage::DismissError => {
            state.reconciler.dismiss_error();
            RunnersUpdate::none()
        }
        RunnersMessage::PageLoaded { ticket, result } => {
            handle_page_loaded(state, &ticket, result)
        }

        RunnersMessage::SetStatus { runner_id, status } => {
            handle_set_status(state, runner_id, status)
        }
        RunnersMessage::ToggleStatus(runner_id) => {
            match state.reconciler.record(&runner_id).map(|r| r.status) {
                Some(current) => {
                    handle_set_status(state, runner_id, current.toggled())
                }
                None => RunnersUpdate::event(RunnersEvent::StatusEditIgnored(
                    runner_id,
                )),
            }
        }
        RunnersMessage::DismissEditError => {
            state.reconciler.dismiss_edit_error();
            RunnersUpdate::none()
        }
        RunnersMessage::StatusSaved { ticket, result } => {
            handle_status_saved(state, &ticket, result)
        }

        RunnersMessage::LocationReceived {
            subscription,
            event,
        } => {
            let location = event.location.clone();
            let status = event.status;
            match state.reconciler.on_delivery(subscription, event) {
                LocationOutcome::Applied(runner_id) => {
                    refresh_open_detail(state, &runner_id);
                    RunnersUpdate::event(RunnersEvent::RunnerMoved {
                        runner_id,
                        location,
                        status,
                    })
                }
                LocationOutcome::Unmatched | LocationOutcome::Ignored => {
                    RunnersUpdate::none()
                }
            }
        }
        RunnersMessage::LiveFeedClosed(subscription) => {
            if state.reconciler.subscription() != Some(subscription) {
                return RunnersUpdate::none();
            }
            log::warn!("[Runners] Live feed closed {}", subscription);
            state.reconciler.detach();
            state.live = None;
            RunnersUpdate::event(RunnersEvent::FeedClosed)
        }

        RunnersMessage::OpenDetail(runner_id) => {
            handle_open_detail(state, runner_id)
        }
        RunnersMessage::RefreshDetail => match state.detail_target.clone() {
            Some(runner_id) => RunnersUpdate::task(detail_task(state, runner_id)),
            None => RunnersUpdate::none(),
        },
        RunnersMessage::CloseDetail => {
            state.detail = None;
            state.detail_target = None;
            RunnersUpdate::none()
        }
        RunnersMessage::DetailLoaded { runner_id, result } => {
            if state.detail_target.as_ref() != Some(&runner_id) {
                return RunnersUpdate::none();
            }
            match result {
                Ok(record) => {
                    let detail = RunnerDetail::from_record(&record);
                    state.detail = Some(detail.clone());
                    RunnersUpdate::event(RunnersEvent::DetailReady(detail))
                }
                Err(error) => RunnersUpdate::event(RunnersEvent::DetailFailed {
                    runner_id,
                    error,
                }),
            }
        }

        RunnersMessage::Export(dir) => {
            let dir = dir.unwrap_or_else(|| state.export_dir.clone());
            let service = state.service.clone();
            let today = Utc::now().date_naive();
            RunnersUpdate::task(Task::perform(
                export::export_runners(service, dir, today),
                RunnersMessage::ExportFinished,
            ))
        }
        RunnersMessage::ExportFinished(result) => {
            RunnersUpdate::event(match result {
                Ok(path) => RunnersEvent::ExportReady(path),
                Err(error) => RunnersEvent::ExportFailed(error),
            })
        }
    }
}

fn handle_mount(state: &mut RunnersDomainState) -> RunnersUpdate {
    if state.live.is_none() {
        let subscription = state.feed.subscribe();
        log::info!("[Runners] Mounted with live subscription {}", subscription.id());
        state.reconciler.attach(subscription.id());
        state.live = Some(subscription);
    }
    let pagination = state.reconciler.pagination();
    let ticket = state.reconciler.fetch_page(pagination.page, pagination.limit);
    RunnersUpdate::task(fetch_task(state, ticket))
}

pub(crate) fn handle_unmount(state: &mut RunnersDomainState) {
    if let Some(subscription) = state.reconciler.detach() {
        state.feed.unsubscribe(subscription);
        log::info!("[Runners] Released live subscription {}", subscription);
    }
    state.live = None;
}

fn fetch_task(
    state: &RunnersDomainState,
    ticket: FetchTicket,
) -> Task<RunnersMessage> {
    let service = state.service.clone();
    let query = ticket.query.clone();
    Task::perform(
        async move { service.list_runners(&query).await },
        move |result| RunnersMessage::PageLoaded { ticket, result },
    )
}

fn optional_fetch(
    state: &RunnersDomainState,
    ticket: Option<FetchTicket>,
) -> RunnersUpdate {
    match ticket {
        Some(ticket) => RunnersUpdate::task(fetch_task(state, ticket)),
        None => RunnersUpdate::none(),
    }
}

fn handle_page_loaded(
    state: &mut RunnersDomainState,
    ticket: &FetchTicket,
    result: ConsoleResult<RunnerPage>,
) -> RunnersUpdate {
    match state.reconciler.on_fetch_result(ticket, result) {
        FetchOutcome::Applied { .. } => {
            if let Some(runner_id) = state.detail_target.clone() {
                refresh_open_detail(state, &runner_id);
            }
            let pagination = state.reconciler.pagination();
            RunnersUpdate::event(RunnersEvent::PageLoaded {
                page: pagination.page,
                total_pages: pagination.total_pages,
                total: pagination.total,
                shown: state.reconciler.records().len(),
            })
        }
        FetchOutcome::Discarded => RunnersUpdate::none(),
        FetchOutcome::Failed(error) => {
            RunnersUpdate::event(RunnersEvent::FetchFailed(error))
        }
    }
}

fn handle_set_status(
    state: &mut RunnersDomainState,
    runner_id: RunnerId,
    status: RunnerStatus,
) -> RunnersUpdate {
    let Some(ticket) =
        state.reconciler.apply_optimistic_status(&runner_id, status)
    else {
        log::warn!("[Runners] Ignoring status edit for undisplayed {}", runner_id);
        return RunnersUpdate::event(RunnersEvent::StatusEditIgnored(runner_id));
    };
    refresh_open_detail(state, &runner_id);

    let service = state.service.clone();
    let request_ticket = ticket.clone();
    RunnersUpdate::task(Task::perform(
        async move {
            service
                .update_runner(
                    &request_ticket.runner_id,
                    UpdateRunnerRequest::status(request_ticket.status),
                )
                .await
        },
        move |result| RunnersMessage::StatusSaved { ticket, result },
    ))
}

fn handle_status_saved(
    state: &mut RunnersDomainState,
    ticket: &StatusEditTicket,
    result: ConsoleResult<RunnerRecord>,
) -> RunnersUpdate {
    let runner_id = ticket.runner_id.clone();
    let update = match result {
        Ok(record) => match state.reconciler.on_status_confirmed(ticket, &record)
        {
            StatusOutcome::Confirmed(status) => {
                RunnersUpdate::event(RunnersEvent::StatusConfirmed {
                    runner_id: runner_id.clone(),
                    status,
                })
            }
            _ => RunnersUpdate::none(),
        },
        Err(error) => {
            match state.reconciler.on_status_failed(ticket, error.clone()) {
                StatusOutcome::RolledBack(status) => {
                    RunnersUpdate::event(RunnersEvent::StatusRolledBack {
                        runner_id: runner_id.clone(),
                        status,
                        error,
                    })
                }
                _ => RunnersUpdate::event(RunnersEvent::StatusEditFailed {
                    runner_id: runner_id.clone(),
                    error,
                }),
            }
        }
    };

    refresh_open_detail(state, &runner_id);
    update
}

fn handle_open_detail(
    state: &mut RunnersDomainState,
    runner_id: RunnerId,
) -> RunnersUpdate {
    state.detail_target = Some(runner_id.clone());
    state.detail = None;

    let mut update = RunnersUpdate::task(detail_task(state, runner_id.clone()));
    if let Some(record) = state.reconciler.record(&runner_id) {
        let detail = RunnerDetail::from_record(record);
        state.detail = Some(detail.clone());
        update = update.with_event(RunnersEvent::DetailReady(detail));
    }
    update
}

fn detail_task(
    state: &RunnersDomainState,
    runner_id: RunnerId,
) -> Task<RunnersMessage> {
    let service = state.service.clone();
    let id = runner_id.clone();
    Task::perform(
        async move { service.fetch_runner(&id).await },
        move |result| RunnersMessage::DetailLoaded { runner_id, result },
    )
}

/// Rebuild the open detail view from the in-memory record
fn refresh_open_detail(state: &mut RunnersDomainState, runner_id: &RunnerId) {
    if state.detail_target.as_ref() != Some(runner_id) {
        return;
    }
    if let Some(record) = state.reconciler.record(runner_id) {
        state.detail = Some(RunnerDetail::from_record(record));
    }
}
