//! Runner list reconciliation
//!
//! [`RunnerListReconciler`] owns the displayed runner collection and is the
//! only thing that mutates it. Three sources feed it:
//!
//! - list fetches, which replace the collection wholesale;
//! - live location events, which patch single records in place;
//! - optimistic status edits, which are applied immediately and later
//!   confirmed or rolled back.
//!
//! Fetch issue and event receipt share one logical clock. Only the most
//! recently issued fetch may apply. Events that arrive while it is in flight
//! are applied to the current records *and* journaled, then replayed on top
//! of the fetched page, so a causally later event is never overwritten by an
//! older snapshot.

use super::journal::EventJournal;
use super::live_feed::SubscriptionId;
use crate::infra::errors::ConsoleError;
use crate::infra::services::api::RunnerQuery;

use marathon_core::console_prelude::{
    LocationEvent, Pagination, RunnerFilters, RunnerId, RunnerPage,
    RunnerRecord, RunnerStatus,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Issued list request. Hand it back with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: RunnerQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Result applied; `replayed` journaled events were re-applied on top
    Applied { replayed: usize },
    /// A newer fetch was issued meanwhile, result ignored
    Discarded,
    /// Latest fetch failed, previous records kept
    Failed(ConsoleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationOutcome {
    Applied(RunnerId),
    /// No displayed record matches the event's identity
    Unmatched,
    /// Not attached, or delivered for a released subscription
    Ignored,
}

/// Issued optimistic edit. Hand it back with the server's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEditTicket {
    pub seq: u64,
    pub runner_id: RunnerId,
    pub status: RunnerStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Server value applied to the record
    Confirmed(RunnerStatus),
    /// Edit failed, record restored to this status
    RolledBack(RunnerStatus),
    /// A newer edit for the same runner is pending; only its base moved
    Superseded,
    /// The edit had already been cleared by a fetch and the record is gone
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingEdit {
    seq: u64,
    /// Status to restore if the edit fails
    previous: RunnerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlightFetch {
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct RunnerListReconciler {
    records: Vec<RunnerRecord>,
    fetch_state: FetchState,
    pagination: Pagination,
    filters: RunnerFilters,
    subscription: Option<SubscriptionId>,

    /// Logical clock shared by fetch issue and event receipt
    clock: u64,
    latest_fetch: Option<u64>,
    in_flight: Option<InFlightFetch>,
    last_query: Option<RunnerQuery>,
    journal: EventJournal,

    next_edit_seq: u64,
    pending_edits: HashMap<RunnerId, PendingEdit>,

    last_error: Option<ConsoleError>,
    last_edit_error: Option<ConsoleError>,
}

impl Default for RunnerListReconciler {
    fn default() -> Self {
        Self::new(Pagination::default().limit, EventJournal::default())
    }
}

impl RunnerListReconciler {
    pub fn new(limit: u32, journal: EventJournal) -> Self {
        Self {
            records: Vec::new(),
            fetch_state: FetchState::Idle,
            pagination: Pagination::new(limit),
            filters: RunnerFilters::default(),
            subscription: None,
            clock: 0,
            latest_fetch: None,
            in_flight: None,
            last_query: None,
            journal,
            next_edit_seq: 0,
            pending_edits: HashMap::new(),
            last_error: None,
            last_edit_error: None,
        }
    }

    // ===== Accessors =====

    pub fn records(&self) -> &[RunnerRecord] {
        &self.records
    }

    pub fn record(&self, id: &RunnerId) -> Option<&RunnerRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn filters(&self) -> &RunnerFilters {
        &self.filters
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn last_error(&self) -> Option<&ConsoleError> {
        self.last_error.as_ref()
    }

    pub fn last_edit_error(&self) -> Option<&ConsoleError> {
        self.last_edit_error.as_ref()
    }

    pub fn has_pending_edit(&self, id: &RunnerId) -> bool {
        self.pending_edits.contains_key(id)
    }

    pub fn pending_edit_count(&self) -> usize {
        self.pending_edits.len()
    }

    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    // ===== Fetching =====

    /// Replace filters, go back to page 1 and issue a fetch
    pub fn set_filters(&mut self, filters: RunnerFilters) -> FetchTicket {
        self.filters = filters;
        let limit = self.pagination.limit;
        self.fetch_page(1, limit)
    }

    /// Issue a fetch for `page` under the current filters.
    ///
    /// Any fetch issued earlier is superseded from here on.
    pub fn fetch_page(&mut self, page: u32, limit: u32) -> FetchTicket {
        let seq = self.tick();
        let query = RunnerQuery::new(page.max(1), limit, self.filters.clone());

        if let Some(previous) = self.in_flight.replace(InFlightFetch { seq }) {
            log::debug!(
                "[Runners] Fetch #{} supersedes in-flight #{}",
                seq,
                previous.seq
            );
        }
        // Events received so far are already reflected in what this fetch
        // will return or are superseded by it.
        self.journal.clear();
        self.latest_fetch = Some(seq);
        self.last_query = Some(query.clone());
        self.fetch_state = FetchState::Loading;

        FetchTicket { seq, query }
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        let p = self.pagination;
        p.has_next().then(|| self.fetch_page(p.page + 1, p.limit))
    }

    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        let p = self.pagination;
        p.has_previous().then(|| self.fetch_page(p.page - 1, p.limit))
    }

    /// Re-issue the last requested query after a failure
    pub fn retry(&mut self) -> Option<FetchTicket> {
        let query = self.last_query.clone()?;
        self.filters = query.filters;
        Some(self.fetch_page(query.page, query.limit))
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn dismiss_edit_error(&mut self) {
        self.last_edit_error = None;
    }

    fn is_latest(&self, ticket: &FetchTicket) -> bool {
        self.latest_fetch == Some(ticket.seq)
            && self.in_flight.is_some_and(|f| f.seq == ticket.seq)
    }

    /// Apply the answer to `ticket`. Results for superseded tickets are
    /// discarded without touching any state.
    pub fn on_fetch_result(
        &mut self,
        ticket: &FetchTicket,
        result: Result<RunnerPage, ConsoleError>,
    ) -> FetchOutcome {
        if !self.is_latest(ticket) {
            log::debug!(
                "[Runners] Discarding stale fetch #{} (latest #{:?})",
                ticket.seq,
                self.latest_fetch
            );
            return FetchOutcome::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let replayed = self.apply_page(ticket, page);
                FetchOutcome::Applied { replayed }
            }
            Err(error) => {
                log::warn!("[Runners] Fetch #{} failed: {}", ticket.seq, error);
                // Journaled events were already applied to the records we keep
                self.journal.clear();
                self.fetch_state = FetchState::Failed;
                self.last_error = Some(error.clone());
                FetchOutcome::Failed(error)
            }
        }
    }

    fn apply_page(&mut self, ticket: &FetchTicket, page: RunnerPage) -> usize {
        let mut seen = HashSet::with_capacity(page.records.len());
        let mut records = Vec::with_capacity(page.records.len());
        for record in page.records {
            if seen.insert(record.id.clone()) {
                records.push(record);
            } else {
                log::warn!(
                    "[Runners] Duplicate runner {} in page, keeping first",
                    record.id
                );
            }
        }

        self.records = records;
        self.pagination = Pagination {
            page: ticket.query.page,
            ..Pagination::new(ticket.query.limit)
        }
        .with_total(page.total);
        self.fetch_state = FetchState::Loaded;
        self.last_error = None;

        if !self.pending_edits.is_empty() {
            log::debug!(
                "[Runners] Fetch #{} overrides {} pending edits",
                ticket.seq,
                self.pending_edits.len()
            );
            self.pending_edits.clear();
        }

        let replay = self.journal.drain_after(ticket.seq);
        let replayed = replay.len();
        for event in &replay {
            self.apply_event(event);
        }

        log::info!(
            "[Runners] Page {}/{} loaded: {} runners of {}, {} events replayed",
            self.pagination.page,
            self.pagination.total_pages,
            self.records.len(),
            self.pagination.total,
            replayed
        );
        replayed
    }

    // ===== Live events =====

    pub fn attach(&mut self, subscription: SubscriptionId) {
        if let Some(previous) = self.subscription.replace(subscription) {
            log::debug!(
                "[Runners] Replacing subscription {} with {}",
                previous,
                subscription
            );
        }
    }

    /// Release the subscription; nothing delivered afterwards is processed
    pub fn detach(&mut self) -> Option<SubscriptionId> {
        self.journal.clear();
        self.subscription.take()
    }

    /// Event delivered through `subscription`; ignored unless it is the
    /// one currently attached.
    pub fn on_delivery(
        &mut self,
        subscription: SubscriptionId,
        event: LocationEvent,
    ) -> LocationOutcome {
        if self.subscription != Some(subscription) {
            return LocationOutcome::Ignored;
        }
        self.on_location_event(event)
    }

    pub fn on_location_event(&mut self, event: LocationEvent) -> LocationOutcome {
        if self.subscription.is_none() {
            return LocationOutcome::Ignored;
        }

        let received_at = self.tick();
        if self.in_flight.is_some() {
            self.journal.record(received_at, event.clone());
        }

        match self.apply_event(&event) {
            Some(id) => LocationOutcome::Applied(id),
            None => LocationOutcome::Unmatched,
        }
    }

    /// Merge `event` into the matching record. Identity is `id` first and
    /// `runnerNumber` as fallback.
    fn apply_event(&mut self, event: &LocationEvent) -> Option<RunnerId> {
        let index = self
            .records
            .iter()
            .position(|record| event.targets_id(record))
            .or_else(|| {
                self.records
                    .iter()
                    .position(|record| event.targets_number(record))
            })?;

        let record = &mut self.records[index];
        record.merge_location(&event.location, event.status);

        // A server-originated status is the new rollback base
        if let Some(status) = event.status
            && let Some(pending) = self.pending_edits.get_mut(&record.id)
        {
            pending.previous = status;
        }

        Some(record.id.clone())
    }

    // ===== Optimistic edits =====

    /// Show `status` immediately. Returns `None` if the runner is not
    /// displayed.
    pub fn apply_optimistic_status(
        &mut self,
        runner_id: &RunnerId,
        status: RunnerStatus,
    ) -> Option<StatusEditTicket> {
        let record = self
            .records
            .iter_mut()
            .find(|record| &record.id == runner_id)?;

        self.next_edit_seq += 1;
        let seq = self.next_edit_seq;
        let previous = self
            .pending_edits
            .get(runner_id)
            .map_or(record.status, |pending| pending.previous);

        record.status = status;
        self.pending_edits
            .insert(runner_id.clone(), PendingEdit { seq, previous });
        self.last_edit_error = None;

        Some(StatusEditTicket {
            seq,
            runner_id: runner_id.clone(),
            status,
        })
    }

    /// The server accepted the edit and returned its record
    pub fn on_status_confirmed(
        &mut self,
        ticket: &StatusEditTicket,
        server: &RunnerRecord,
    ) -> StatusOutcome {
        match self.pending_edits.get(&ticket.runner_id).copied() {
            Some(pending) if pending.seq > ticket.seq => {
                if let Some(entry) = self.pending_edits.get_mut(&ticket.runner_id)
                {
                    entry.previous = server.status;
                }
                StatusOutcome::Superseded
            }
            Some(_) => {
                self.pending_edits.remove(&ticket.runner_id);
                self.set_status(&ticket.runner_id, server.status)
            }
            // Cleared by a fetch; the confirmation is still newer than it
            None => self.set_status(&ticket.runner_id, server.status),
        }
    }

    /// The server rejected the edit, or the request never arrived
    pub fn on_status_failed(
        &mut self,
        ticket: &StatusEditTicket,
        error: ConsoleError,
    ) -> StatusOutcome {
        log::warn!(
            "[Runners] Status change for {} failed: {}",
            ticket.runner_id,
            error
        );
        self.last_edit_error = Some(error);

        match self.pending_edits.get(&ticket.runner_id).copied() {
            Some(pending) if pending.seq == ticket.seq => {
                self.pending_edits.remove(&ticket.runner_id);
                match self.record_mut(&ticket.runner_id) {
                    Some(record) => {
                        record.status = pending.previous;
                        StatusOutcome::RolledBack(pending.previous)
                    }
                    None => StatusOutcome::Stale,
                }
            }
            Some(_) => StatusOutcome::Superseded,
            None => StatusOutcome::Stale,
        }
    }

    fn record_mut(&mut self, id: &RunnerId) -> Option<&mut RunnerRecord> {
        self.records.iter_mut().find(|record| &record.id == id)
    }

    fn set_status(
        &mut self,
        id: &RunnerId,
        status: RunnerStatus,
    ) -> StatusOutcome {
        match self.record_mut(id) {
            Some(record) => {
                record.status = status;
                StatusOutcome::Confirmed(status)
            }
            None => StatusOutcome::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marathon_core::console_prelude::{GeoPoint, RunnerNumber};
    use marathon_model::chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn runner(id: &str, number: &str, status: RunnerStatus) -> RunnerRecord {
        RunnerRecord {
            id: RunnerId::new(id),
            runner_number: RunnerNumber::new(number),
            name: format!("Runner {id}"),
            email: Some(format!("{id}@example.com")),
            phone: None,
            status,
            registered_categories: BTreeSet::from(["42km".to_string()]),
            last_known_location: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    fn page(records: Vec<RunnerRecord>, total: u64) -> RunnerPage {
        RunnerPage { records, total }
    }

    fn point(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat).unwrap()
    }

    fn loaded(records: Vec<RunnerRecord>) -> RunnerListReconciler {
        let mut reconciler = RunnerListReconciler::default();
        reconciler.attach(SubscriptionId::new(1));
        let total = records.len() as u64;
        let ticket = reconciler.fetch_page(1, 10);
        reconciler.on_fetch_result(&ticket, Ok(page(records, total)));
        reconciler
    }

    #[test]
    fn only_latest_fetch_applies() {
        let mut reconciler = RunnerListReconciler::default();
        let a = reconciler.fetch_page(1, 10);
        let b = reconciler.fetch_page(2, 10);

        let page_two = vec![runner("r11", "011", RunnerStatus::Active)];
        assert_eq!(
            reconciler.on_fetch_result(&b, Ok(page(page_two, 11))),
            FetchOutcome::Applied { replayed: 0 }
        );
        let page_one = vec![runner("r1", "001", RunnerStatus::Active)];
        assert_eq!(
            reconciler.on_fetch_result(&a, Ok(page(page_one, 11))),
            FetchOutcome::Discarded
        );

        assert_eq!(reconciler.pagination().page, 2);
        assert_eq!(reconciler.records()[0].id.as_str(), "r11");
    }

    #[test]
    fn stale_filters_never_apply() {
        let mut reconciler = RunnerListReconciler::default();
        let old = reconciler.fetch_page(3, 10);
        let new = reconciler.set_filters(
            RunnerFilters::default().with_status(RunnerStatus::Active),
        );
        assert_eq!(new.query.page, 1);

        assert_eq!(
            reconciler.on_fetch_result(&old, Ok(page(vec![], 0))),
            FetchOutcome::Discarded
        );
        assert_eq!(reconciler.fetch_state(), FetchState::Loading);
    }

    #[test]
    fn total_pages_follow_filtered_count() {
        let mut reconciler = RunnerListReconciler::default();
        let ticket = reconciler.set_filters(
            RunnerFilters::default().with_status(RunnerStatus::Active),
        );
        let records = vec![
            runner("r1", "001", RunnerStatus::Active),
            runner("r2", "002", RunnerStatus::Active),
        ];

        reconciler.on_fetch_result(&ticket, Ok(page(records, 25)));

        let pagination = reconciler.pagination();
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total, 25);
        assert_eq!(reconciler.records().len(), 2);
    }

    #[test]
    fn failure_keeps_previous_records() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let ticket = reconciler.fetch_page(2, 10);

        let outcome = reconciler.on_fetch_result(
            &ticket,
            Err(ConsoleError::Network("timeout".into())),
        );

        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        assert_eq!(reconciler.fetch_state(), FetchState::Failed);
        assert_eq!(reconciler.records().len(), 1);
        assert!(reconciler.last_error().is_some());

        reconciler.dismiss_error();
        assert!(reconciler.last_error().is_none());
        let retry = reconciler.retry().unwrap();
        assert_eq!(retry.query.page, 2);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let first = runner("r1", "001", RunnerStatus::Active);
        let mut dup = runner("r1", "999", RunnerStatus::Inactive);
        dup.name = "Impostor".into();

        let reconciler =
            loaded(vec![first, dup, runner("r2", "002", RunnerStatus::Active)]);

        assert_eq!(reconciler.records().len(), 2);
        assert_eq!(reconciler.records()[0].name, "Runner r1");
    }

    #[test]
    fn event_for_absent_runner_is_noop() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let before = reconciler.records().to_vec();

        let outcome = reconciler.on_location_event(LocationEvent::for_id(
            RunnerId::new("ghost"),
            point(31.0, -17.8),
        ));

        assert_eq!(outcome, LocationOutcome::Unmatched);
        assert_eq!(reconciler.records(), before.as_slice());
    }

    #[test]
    fn event_changes_only_location_and_status() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let before = reconciler.records()[0].clone();

        reconciler.on_location_event(
            LocationEvent::for_id(RunnerId::new("r1"), point(31.1, -17.9))
                .with_status(RunnerStatus::Completed),
        );

        let after = &reconciler.records()[0];
        assert_eq!(after.last_known_location, Some(point(31.1, -17.9)));
        assert_eq!(after.status, RunnerStatus::Completed);
        assert_eq!(after.name, before.name);
        assert_eq!(after.email, before.email);
        assert_eq!(after.registered_categories, before.registered_categories);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn event_falls_back_to_runner_number() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);

        let mut event =
            LocationEvent::for_number(RunnerNumber::new("001"), point(1.0, 2.0));
        event.runner_id = Some(RunnerId::new("unknown"));

        assert_eq!(
            reconciler.on_location_event(event),
            LocationOutcome::Applied(RunnerId::new("r1"))
        );
    }

    #[test]
    fn event_during_fetch_survives_apply() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let ticket = reconciler.fetch_page(1, 10);

        reconciler.on_location_event(LocationEvent::for_id(
            RunnerId::new("r1"),
            point(31.2, -17.7),
        ));
        assert_eq!(reconciler.journal_len(), 1);

        let outcome = reconciler.on_fetch_result(
            &ticket,
            Ok(page(vec![runner("r1", "001", RunnerStatus::Active)], 1)),
        );

        assert_eq!(outcome, FetchOutcome::Applied { replayed: 1 });
        assert_eq!(
            reconciler.records()[0].last_known_location,
            Some(point(31.2, -17.7))
        );
        assert_eq!(reconciler.journal_len(), 0);
    }

    #[test]
    fn event_before_fetch_issue_is_superseded() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let first = reconciler.fetch_page(1, 10);
        reconciler.on_location_event(LocationEvent::for_id(
            RunnerId::new("r1"),
            point(31.2, -17.7),
        ));
        let second = reconciler.fetch_page(1, 10);

        reconciler.on_fetch_result(&first, Ok(page(vec![], 0)));
        let outcome = reconciler.on_fetch_result(
            &second,
            Ok(page(vec![runner("r1", "001", RunnerStatus::Active)], 1)),
        );

        assert_eq!(outcome, FetchOutcome::Applied { replayed: 0 });
        assert_eq!(reconciler.records()[0].last_known_location, None);
    }

    #[test]
    fn detached_reconciler_ignores_events() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let sub = reconciler.detach().unwrap();

        let event =
            LocationEvent::for_id(RunnerId::new("r1"), point(5.0, 5.0));
        assert_eq!(
            reconciler.on_delivery(sub, event.clone()),
            LocationOutcome::Ignored
        );
        assert_eq!(
            reconciler.on_location_event(event),
            LocationOutcome::Ignored
        );
        assert_eq!(reconciler.records()[0].last_known_location, None);
    }

    #[test]
    fn delivery_from_foreign_subscription_is_ignored() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let event =
            LocationEvent::for_id(RunnerId::new("r1"), point(5.0, 5.0));

        assert_eq!(
            reconciler.on_delivery(SubscriptionId::new(99), event),
            LocationOutcome::Ignored
        );
    }

    #[test]
    fn failed_edit_restores_exact_previous_status() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Registered)]);
        let id = RunnerId::new("r1");

        let ticket = reconciler
            .apply_optimistic_status(&id, RunnerStatus::Active)
            .unwrap();
        assert_eq!(reconciler.record(&id).unwrap().status, RunnerStatus::Active);

        let outcome = reconciler
            .on_status_failed(&ticket, ConsoleError::api(Some(500), "boom"));

        assert_eq!(outcome, StatusOutcome::RolledBack(RunnerStatus::Registered));
        assert_eq!(
            reconciler.record(&id).unwrap().status,
            RunnerStatus::Registered
        );
        assert!(reconciler.last_edit_error().is_some());
        assert!(!reconciler.has_pending_edit(&id));
    }

    #[test]
    fn confirmation_applies_server_value() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let id = RunnerId::new("r1");
        let ticket = reconciler
            .apply_optimistic_status(&id, RunnerStatus::Completed)
            .unwrap();

        let server = runner("r1", "001", RunnerStatus::Inactive);
        assert_eq!(
            reconciler.on_status_confirmed(&ticket, &server),
            StatusOutcome::Confirmed(RunnerStatus::Inactive)
        );
        assert_eq!(reconciler.record(&id).unwrap().status, RunnerStatus::Inactive);
    }

    #[test]
    fn superseded_edit_failure_keeps_newer_value() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Registered)]);
        let id = RunnerId::new("r1");
        let first = reconciler
            .apply_optimistic_status(&id, RunnerStatus::Active)
            .unwrap();
        let second = reconciler
            .apply_optimistic_status(&id, RunnerStatus::Completed)
            .unwrap();

        assert_eq!(
            reconciler.on_status_failed(&first, ConsoleError::Unauthorized),
            StatusOutcome::Superseded
        );
        assert_eq!(
            reconciler.record(&id).unwrap().status,
            RunnerStatus::Completed
        );

        // The base carried forward is the status before both edits
        assert_eq!(
            reconciler.on_status_failed(&second, ConsoleError::Unauthorized),
            StatusOutcome::RolledBack(RunnerStatus::Registered)
        );
    }

    #[test]
    fn fetch_clears_pending_edits_and_late_failure_does_not_roll_back() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let id = RunnerId::new("r1");
        let edit = reconciler
            .apply_optimistic_status(&id, RunnerStatus::Completed)
            .unwrap();

        let ticket = reconciler.fetch_page(1, 10);
        reconciler.on_fetch_result(
            &ticket,
            Ok(page(vec![runner("r1", "001", RunnerStatus::Completed)], 1)),
        );
        assert_eq!(reconciler.pending_edit_count(), 0);

        assert_eq!(
            reconciler.on_status_failed(&edit, ConsoleError::Network("x".into())),
            StatusOutcome::Stale
        );
        assert_eq!(
            reconciler.record(&id).unwrap().status,
            RunnerStatus::Completed
        );
    }

    #[test]
    fn late_confirmation_after_fetch_still_applies() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Active)]);
        let id = RunnerId::new("r1");
        let edit = reconciler
            .apply_optimistic_status(&id, RunnerStatus::Completed)
            .unwrap();
        let ticket = reconciler.fetch_page(1, 10);
        reconciler.on_fetch_result(
            &ticket,
            Ok(page(vec![runner("r1", "001", RunnerStatus::Active)], 1)),
        );

        let server = runner("r1", "001", RunnerStatus::Completed);
        assert_eq!(
            reconciler.on_status_confirmed(&edit, &server),
            StatusOutcome::Confirmed(RunnerStatus::Completed)
        );
    }

    #[test]
    fn event_status_becomes_rollback_base() {
        let mut reconciler =
            loaded(vec![runner("r1", "001", RunnerStatus::Registered)]);
        let id = RunnerId::new("r1");
        let edit = reconciler
            .apply_optimistic_status(&id, RunnerStatus::Completed)
            .unwrap();

        reconciler.on_location_event(
            LocationEvent::for_id(id.clone(), point(0.0, 0.0))
                .with_status(RunnerStatus::Active),
        );

        assert_eq!(
            reconciler.on_status_failed(&edit, ConsoleError::Unauthorized),
            StatusOutcome::RolledBack(RunnerStatus::Active)
        );
    }

    #[test]
    fn edit_for_undisplayed_runner_is_refused() {
        let mut reconciler = loaded(vec![]);
        assert!(
            reconciler
                .apply_optimistic_status(
                    &RunnerId::new("nobody"),
                    RunnerStatus::Active
                )
                .is_none()
        );
    }

    #[test]
    fn paging_helpers_respect_bounds() {
        let mut reconciler = RunnerListReconciler::default();
        let ticket = reconciler.fetch_page(1, 10);
        reconciler.on_fetch_result(&ticket, Ok(page(vec![], 25)));

        assert!(reconciler.previous_page().is_none());
        let next = reconciler.next_page().unwrap();
        assert_eq!(next.query.page, 2);
    }
}
