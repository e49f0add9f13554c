//! Single-task event loop driving the runners domain.
//!
//! The controller owns [`RunnersDomainState`] outright. Commands arrive on an
//! mpsc inbox, network calls run as futures inside the same task and report
//! back as messages, and live events are pulled from the attached
//! subscription. Nothing else ever touches the reconciler.

use super::live_feed::{LocationSubscription, SubscriptionId};
use super::messages::{RunnersEvent, RunnersMessage};
use super::update::{RunnersUpdate, handle_unmount, update_runners};
use super::{RunnersDomainState, RunnersSnapshot};
use crate::domains::auth::state_types::{AuthState, SessionStore};

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use marathon_core::console_prelude::{
    LocationEvent, RunnerFilters, RunnerId, RunnerStatus,
};
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Cloneable command side of a running controller
#[derive(Debug, Clone)]
pub struct RunnersHandle {
    inbox: mpsc::UnboundedSender<RunnersMessage>,
    snapshot: watch::Receiver<RunnersSnapshot>,
}

impl RunnersHandle {
    /// Queue a message; `false` once the controller has stopped
    pub fn send(&self, message: RunnersMessage) -> bool {
        self.inbox.send(message).is_ok()
    }

    pub fn mount(&self) -> bool {
        self.send(RunnersMessage::Mount)
    }

    pub fn unmount(&self) -> bool {
        self.send(RunnersMessage::Unmount)
    }

    pub fn set_filters(&self, filters: RunnerFilters) -> bool {
        self.send(RunnersMessage::SetFilters(filters))
    }

    pub fn fetch_page(&self, page: u32, limit: Option<u32>) -> bool {
        self.send(RunnersMessage::FetchPage { page, limit })
    }

    pub fn set_status(&self, runner_id: RunnerId, status: RunnerStatus) -> bool {
        self.send(RunnersMessage::SetStatus { runner_id, status })
    }

    pub fn toggle_status(&self, runner_id: RunnerId) -> bool {
        self.send(RunnersMessage::ToggleStatus(runner_id))
    }

    pub fn open_detail(&self, runner_id: RunnerId) -> bool {
        self.send(RunnersMessage::OpenDetail(runner_id))
    }

    pub fn export(&self, dir: Option<PathBuf>) -> bool {
        self.send(RunnersMessage::Export(dir))
    }

    pub fn shutdown(&self) -> bool {
        self.send(RunnersMessage::Shutdown)
    }

    /// Latest published view of the runners list
    pub fn snapshot(&self) -> RunnersSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<RunnersSnapshot> {
        self.snapshot.clone()
    }
}

pub struct RunnersController {
    state: RunnersDomainState,
    inbox: mpsc::UnboundedReceiver<RunnersMessage>,
    in_flight: FuturesUnordered<BoxFuture<'static, RunnersMessage>>,
    events: mpsc::UnboundedSender<RunnersEvent>,
    snapshot: watch::Sender<RunnersSnapshot>,
    session: watch::Receiver<AuthState>,
    session_open: bool,
    expiry_reported: bool,
}

impl std::fmt::Debug for RunnersController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnersController")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl RunnersController {
    pub fn new(
        state: RunnersDomainState,
        session: &SessionStore,
    ) -> (Self, RunnersHandle, mpsc::UnboundedReceiver<RunnersEvent>) {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let session = session.subscribe();
        // A controller started without a session has nothing to expire
        let expiry_reported =
            matches!(*session.borrow(), AuthState::Unauthenticated);

        let controller = Self {
            state,
            inbox: inbox_rx,
            in_flight: FuturesUnordered::new(),
            events: events_tx,
            snapshot: snapshot_tx,
            session,
            session_open: true,
            expiry_reported,
        };
        let handle = RunnersHandle {
            inbox: inbox_tx,
            snapshot: snapshot_rx,
        };
        (controller, handle, events_rx)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until `Shutdown` arrives or every handle is dropped
    pub async fn run(mut self) {
        log::debug!("[Runners] Controller started");
        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(RunnersMessage::Shutdown) | None => break,
                    Some(message) => self.dispatch(message),
                },
                Some(message) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.dispatch(message);
                }
                (subscription, event) = next_delivery(&mut self.state.live) => {
                    let message = match event {
                        Some(event) => RunnersMessage::LocationReceived { subscription, event },
                        None => RunnersMessage::LiveFeedClosed(subscription),
                    };
                    self.dispatch(message);
                }
                changed = self.session.changed(), if self.session_open => {
                    if changed.is_err() {
                        self.session_open = false;
                        continue;
                    }
                    let logged_out = matches!(
                        *self.session.borrow_and_update(),
                        AuthState::Unauthenticated
                    );
                    // Report the transition, not every repeated write
                    if logged_out && !self.expiry_reported {
                        log::warn!("[Runners] Session expired");
                        self.emit(RunnersEvent::SessionExpired);
                    }
                    self.expiry_reported = logged_out;
                }
            }
        }

        handle_unmount(&mut self.state);
        self.publish_snapshot();
        log::debug!(
            "[Runners] Controller stopped, {} requests abandoned",
            self.in_flight.len()
        );
    }

    fn dispatch(&mut self, message: RunnersMessage) {
        let RunnersUpdate { task, events } =
            update_runners(&mut self.state, message);

        self.in_flight.extend(task.into_futures());
        // Listeners reacting to an event must already see the new state
        self.publish_snapshot();
        for event in events {
            self.emit(event);
        }
    }

    fn emit(&self, event: RunnersEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn publish_snapshot(&self) {
        self.snapshot.send_replace(self.state.snapshot());
    }
}

/// Next event on the attached subscription; pends forever when detached
async fn next_delivery(
    live: &mut Option<LocationSubscription>,
) -> (SubscriptionId, Option<LocationEvent>) {
    match live {
        Some(subscription) => (subscription.id(), subscription.recv().await),
        None => std::future::pending().await,
    }
}
