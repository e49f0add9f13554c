//! Fixtures shared by the runners and session integration tests
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use marathon_console::common::Task;
use marathon_console::domains::runners::live_feed::LocationHub;
use marathon_console::domains::runners::update::{RunnersUpdate, update_runners};
use marathon_console::domains::runners::{
    RunnersDomainState, RunnersEvent, RunnersMessage,
};
use marathon_console::infra::config::ConsoleConfig;
use marathon_console::infra::testing::stubs::StubRunnerService;
use marathon_core::console_prelude::{
    RunnerId, RunnerNumber, RunnerRecord, RunnerStatus,
};
use marathon_model::chrono::Utc;
use tokio::sync::mpsc;

pub fn runner(n: usize, status: RunnerStatus) -> RunnerRecord {
    RunnerRecord {
        id: RunnerId::new(format!("r{n}")),
        runner_number: RunnerNumber::new(format!("{n:03}")),
        name: format!("Runner {n}"),
        email: Some(format!("runner{n}@example.com")),
        phone: None,
        status,
        registered_categories: BTreeSet::from(["10K".to_string()]),
        last_known_location: None,
        created_at: Utc::now(),
    }
}

/// `count` runners, all registered
pub fn field(count: usize) -> Vec<RunnerRecord> {
    (1..=count)
        .map(|n| runner(n, RunnerStatus::Registered))
        .collect()
}

pub fn domain_state(
    stub: &StubRunnerService,
    hub: &LocationHub,
    config: &ConsoleConfig,
) -> RunnersDomainState {
    RunnersDomainState::new(
        Arc::new(stub.clone()),
        Arc::new(hub.clone()),
        config,
    )
}

/// Run every future of a task to completion, in order
pub async fn settle(task: Task<RunnersMessage>) -> Vec<RunnersMessage> {
    let mut messages = Vec::new();
    for future in task.into_futures() {
        messages.push(future.await);
    }
    messages
}

/// Receive events until one matches, failing the test after two seconds
pub async fn wait_for_event(
    events: &mut mpsc::UnboundedReceiver<RunnersEvent>,
    matches: impl Fn(&RunnersEvent) -> bool,
) -> RunnersEvent {
    let wait = async {
        loop {
            match events.recv().await {
                Some(event) if matches(&event) => return event,
                Some(_) => continue,
                None => panic!("controller stopped before the event arrived"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(2), wait)
        .await
        .expect("timed out waiting for runners event")
}

/// Feed `message` through the update function, running follow-up tasks
/// until nothing is left, and collect every event along the way
pub async fn drive(
    state: &mut RunnersDomainState,
    message: RunnersMessage,
) -> Vec<RunnersEvent> {
    let mut queue = std::collections::VecDeque::from([message]);
    let mut events = Vec::new();
    while let Some(message) = queue.pop_front() {
        let RunnersUpdate {
            task,
            events: emitted,
        } = update_runners(state, message);
        events.extend(emitted);
        queue.extend(settle(task).await);
    }
    events
}
