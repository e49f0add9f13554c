use crate::infra::api_client::ByteStream;
use crate::infra::errors::{ConsoleError, ConsoleResult};
use crate::infra::services::api::{RunnerQuery, RunnerService};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use marathon_core::console_prelude::{
    RunnerId, RunnerPage, RunnerRecord, UpdateRunnerRequest,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Notify, oneshot};

/// A list request observed by the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub index: usize,
    pub query: RunnerQuery,
}

/// In-memory [`RunnerService`].
///
/// In the default mode every call is answered immediately from the dataset.
/// With [`StubRunnerService::manual_lists`] (or `manual_updates`) the calls
/// park until the test resolves them, in whatever order it likes, which is
/// how overlapping fetches are reproduced.
#[derive(Debug, Clone, Default)]
pub struct StubRunnerService {
    inner: Arc<Mutex<InnerRunnerState>>,
    calls_changed: Arc<Notify>,
}

#[derive(Debug, Default)]
struct InnerRunnerState {
    dataset: Vec<RunnerRecord>,
    export_body: Vec<u8>,
    manual_lists: bool,
    manual_updates: bool,
    list_calls: Vec<ListCall>,
    update_calls: Vec<(RunnerId, UpdateRunnerRequest)>,
    parked_lists: Vec<Option<oneshot::Sender<ConsoleResult<RunnerPage>>>>,
    parked_updates: Vec<Option<oneshot::Sender<ConsoleResult<RunnerRecord>>>>,
    list_failures: VecDeque<ConsoleError>,
    update_failures: VecDeque<ConsoleError>,
}

impl StubRunnerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runners(self, runners: Vec<RunnerRecord>) -> Self {
        self.inner.lock().dataset = runners;
        self
    }

    pub fn with_export_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.inner.lock().export_body = body.into();
        self
    }

    /// Park list calls until [`Self::resolve_list`] answers them
    pub fn manual_lists(self) -> Self {
        self.inner.lock().manual_lists = true;
        self
    }

    /// Park update calls until [`Self::resolve_update`] answers them
    pub fn manual_updates(self) -> Self {
        self.inner.lock().manual_updates = true;
        self
    }

    /// Make the next automatically answered list call fail
    pub fn fail_next_list(&self, error: ConsoleError) {
        self.inner.lock().list_failures.push_back(error);
    }

    /// Make the next automatically answered update call fail
    pub fn fail_next_update(&self, error: ConsoleError) {
        self.inner.lock().update_failures.push_back(error);
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.inner.lock().list_calls.clone()
    }

    pub fn update_calls(&self) -> Vec<(RunnerId, UpdateRunnerRequest)> {
        self.inner.lock().update_calls.clone()
    }

    pub fn dataset(&self) -> Vec<RunnerRecord> {
        self.inner.lock().dataset.clone()
    }

    /// Answer a parked list call. Returns `false` when the call does not
    /// exist, was already answered, or its caller has gone away.
    pub fn resolve_list(
        &self,
        index: usize,
        result: ConsoleResult<RunnerPage>,
    ) -> bool {
        let sender = self
            .inner
            .lock()
            .parked_lists
            .get_mut(index)
            .and_then(Option::take);
        sender.is_some_and(|tx| tx.send(result).is_ok())
    }

    /// Answer a parked list call from the dataset, as auto mode would
    pub fn resolve_list_from_dataset(&self, index: usize) -> bool {
        let page = {
            let inner = self.inner.lock();
            inner
                .list_calls
                .get(index)
                .map(|call| page_from(&inner.dataset, &call.query))
        };
        match page {
            Some(page) => self.resolve_list(index, Ok(page)),
            None => false,
        }
    }

    pub fn resolve_update(
        &self,
        index: usize,
        result: ConsoleResult<RunnerRecord>,
    ) -> bool {
        let sender = self
            .inner
            .lock()
            .parked_updates
            .get_mut(index)
            .and_then(Option::take);
        sender.is_some_and(|tx| tx.send(result).is_ok())
    }

    /// Wait until at least `count` list calls have been made
    pub async fn wait_for_list_calls(&self, count: usize) {
        loop {
            let notified = self.calls_changed.notified();
            if self.inner.lock().list_calls.len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Wait until at least `count` update calls have been made
    pub async fn wait_for_update_calls(&self, count: usize) {
        loop {
            let notified = self.calls_changed.notified();
            if self.inner.lock().update_calls.len() >= count {
                return;
            }
            notified.await;
        }
    }
}

fn matches_query(record: &RunnerRecord, query: &RunnerQuery) -> bool {
    let filters = &query.filters;
    if filters.status.is_some_and(|status| record.status != status) {
        return false;
    }
    let category = filters.category.trim();
    if !category.is_empty() && !record.in_category(category) {
        return false;
    }
    let search = filters.search.trim().to_lowercase();
    if !search.is_empty() {
        let in_name = record.name.to_lowercase().contains(&search);
        let in_number =
            record.runner_number.as_str().to_lowercase().contains(&search);
        let in_email = record
            .email
            .as_deref()
            .is_some_and(|email| email.to_lowercase().contains(&search));
        if !(in_name || in_number || in_email) {
            return false;
        }
    }
    true
}

fn page_from(dataset: &[RunnerRecord], query: &RunnerQuery) -> RunnerPage {
    let matching: Vec<&RunnerRecord> = dataset
        .iter()
        .filter(|record| matches_query(record, query))
        .collect();
    let limit = query.limit as usize;
    let skip = (query.page.saturating_sub(1) as usize).saturating_mul(limit);

    RunnerPage {
        records: matching
            .iter()
            .skip(skip)
            .take(limit)
            .map(|record| (*record).clone())
            .collect(),
        total: matching.len() as u64,
    }
}

/// Either a parked call waiting on the test, or an immediate answer
enum Reply<T> {
    Parked(oneshot::Receiver<ConsoleResult<T>>),
    Ready(ConsoleResult<T>),
}

impl<T> Reply<T> {
    async fn into_result(self) -> ConsoleResult<T> {
        match self {
            Reply::Parked(rx) => rx.await.unwrap_or_else(|_| {
                Err(ConsoleError::Network("stub call abandoned".to_string()))
            }),
            Reply::Ready(result) => result,
        }
    }
}

fn not_found() -> ConsoleError {
    ConsoleError::api(Some(404), "Runner not found")
}

#[async_trait]
impl RunnerService for StubRunnerService {
    async fn list_runners(
        &self,
        query: &RunnerQuery,
    ) -> ConsoleResult<RunnerPage> {
        let reply = {
            let mut inner = self.inner.lock();
            let index = inner.list_calls.len();
            inner.list_calls.push(ListCall {
                index,
                query: query.clone(),
            });

            if inner.manual_lists {
                let (tx, rx) = oneshot::channel();
                inner.parked_lists.push(Some(tx));
                Reply::Parked(rx)
            } else {
                inner.parked_lists.push(None);
                Reply::Ready(match inner.list_failures.pop_front() {
                    Some(error) => Err(error),
                    None => Ok(page_from(&inner.dataset, query)),
                })
            }
        };
        self.calls_changed.notify_waiters();
        reply.into_result().await
    }

    async fn fetch_runner(&self, id: &RunnerId) -> ConsoleResult<RunnerRecord> {
        self.inner
            .lock()
            .dataset
            .iter()
            .find(|record| &record.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn update_runner(
        &self,
        id: &RunnerId,
        request: UpdateRunnerRequest,
    ) -> ConsoleResult<RunnerRecord> {
        let reply = {
            let mut inner = self.inner.lock();
            inner.update_calls.push((id.clone(), request.clone()));

            if inner.manual_updates {
                let (tx, rx) = oneshot::channel();
                inner.parked_updates.push(Some(tx));
                Reply::Parked(rx)
            } else {
                inner.parked_updates.push(None);
                let result = match inner.update_failures.pop_front() {
                    Some(error) => Err(error),
                    None => inner
                        .dataset
                        .iter_mut()
                        .find(|record| &record.id == id)
                        .map(|record| {
                            record.status = request.status;
                            if let Some(location) = &request.last_known_location
                            {
                                record.last_known_location =
                                    Some(location.clone());
                            }
                            record.clone()
                        })
                        .ok_or_else(not_found),
                };
                Reply::Ready(result)
            }
        };
        self.calls_changed.notify_waiters();
        reply.into_result().await
    }

    async fn export_runners(&self) -> ConsoleResult<ByteStream> {
        let body = self.inner.lock().export_body.clone();
        let chunks: Vec<ConsoleResult<Vec<u8>>> =
            body.chunks(64).map(|chunk| Ok(chunk.to_vec())).collect();
        Ok(stream::iter(chunks).boxed())
    }
}
