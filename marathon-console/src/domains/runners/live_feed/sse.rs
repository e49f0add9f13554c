//! Server-sent events bridge for runner locations.
//!
//! Connects to `GET /events/runners`, decodes `runner_location` payloads and
//! republishes them through a [`LocationHub`], reconnecting with exponential
//! backoff until the retry budget is spent.

use super::{LiveLocationFeed, LocationHub, LocationSubscription, SubscriptionId};
use crate::domains::auth::state_types::SessionStore;

use futures::StreamExt;
use marathon_core::console_prelude::{LocationEvent, v1};
use reqwest::StatusCode;
use reqwest_eventsource::{Event, EventSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAX_BACKOFF_SECS: u64 = 30;

/// Backoff before reconnect attempt `retry` (1-based): 1, 2, 4 ... capped.
pub fn backoff_delay(retry: u32) -> Duration {
    let exp = retry.saturating_sub(1).min(16);
    Duration::from_secs(std::cmp::min(MAX_BACKOFF_SECS, 2u64.pow(exp)))
}

#[derive(Debug)]
enum LocationSseEvent {
    Open,
    Message(eventsource_stream::Event),
    Error(String),
    /// Server refused the token; reconnecting would not help
    Unauthorized,
    Closed,
}

/// Live feed backed by the server's SSE stream
#[derive(Debug, Clone)]
pub struct SseLocationFeed {
    hub: LocationHub,
    url: String,
    session: SessionStore,
    max_retries: u32,
}

impl SseLocationFeed {
    pub fn new(
        base_url: &str,
        session: SessionStore,
        max_retries: u32,
    ) -> Self {
        Self {
            hub: LocationHub::new(),
            url: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                v1::events::RUNNERS
            ),
            session,
            max_retries,
        }
    }

    pub fn hub(&self) -> &LocationHub {
        &self.hub
    }

    /// Start pumping the stream into the hub on the current runtime
    pub fn spawn(&self) -> JoinHandle<()> {
        let mut state = LocationFeedState::new(
            self.url.clone(),
            self.session.clone(),
            self.max_retries,
        );
        let hub = self.hub.clone();
        tokio::spawn(async move {
            while let Some(event) = state.next_event().await {
                let delivered = hub.publish(event);
                log::trace!("[LiveFeed] Event delivered to {delivered} subscribers");
            }
            log::info!("[LiveFeed] Runner location stream stopped");
            hub.close();
        })
    }
}

impl LiveLocationFeed for SseLocationFeed {
    fn subscribe(&self) -> LocationSubscription {
        self.hub.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub.unsubscribe(id);
    }
}

/// Reconnecting reader over one SSE endpoint
struct LocationFeedState {
    url: String,
    session: SessionStore,
    event_receiver: Option<mpsc::UnboundedReceiver<LocationSseEvent>>,
    task_handle: Option<JoinHandle<()>>,
    retry_count: u32,
    max_retries: u32,
}

impl Drop for LocationFeedState {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl LocationFeedState {
    fn new(url: String, session: SessionStore, max_retries: u32) -> Self {
        Self {
            url,
            session,
            event_receiver: None,
            task_handle: None,
            retry_count: 0,
            max_retries,
        }
    }

    async fn next_event(&mut self) -> Option<LocationEvent> {
        loop {
            if self.event_receiver.is_none() {
                if self.session.token().is_none() {
                    log::warn!("[LiveFeed] No session, not connecting");
                    return None;
                }
                self.create_event_source().await;
            }

            let receiver = self.event_receiver.as_mut()?;
            match receiver.recv().await {
                Some(LocationSseEvent::Open) => {
                    log::info!("[LiveFeed] SSE connection opened");
                    self.retry_count = 0;
                }
                Some(LocationSseEvent::Message(msg)) => {
                    if let Some(event) = decode_message(&msg) {
                        return Some(event);
                    }
                }
                Some(LocationSseEvent::Unauthorized) => {
                    if self.session.invalidate() {
                        log::warn!(
                            "[LiveFeed] Session rejected by event stream, logging out"
                        );
                    }
                    return None;
                }
                Some(LocationSseEvent::Error(e)) => {
                    log::error!("[LiveFeed] SSE error: {}", e);
                    if self.handle_connection_error() {
                        return None;
                    }
                }
                Some(LocationSseEvent::Closed) | None => {
                    log::warn!("[LiveFeed] SSE stream ended");
                    if self.handle_connection_error() {
                        return None;
                    }
                }
            }
        }
    }

    async fn create_event_source(&mut self) {
        if self.retry_count > 0 {
            let delay = backoff_delay(self.retry_count);
            log::info!(
                "[LiveFeed] Retrying connection after {:?} (attempt #{})",
                delay,
                self.retry_count + 1
            );
            tokio::time::sleep(delay).await;
        }

        log::info!("[LiveFeed] Connecting to {}", self.url);

        let (tx, rx) = mpsc::unbounded_channel();
        self.event_receiver = Some(rx);

        let url = self.url.clone();
        let token = self.session.token();
        let task_handle = tokio::spawn(async move {
            let mut request = reqwest::Client::new().get(&url);
            if let Some(token) = token {
                request = request.bearer_auth(token.as_str());
            }

            match EventSource::new(request) {
                Ok(mut event_source) => {
                    while let Some(event) = event_source.next().await {
                        let sse_event = match event {
                            Ok(Event::Open) => LocationSseEvent::Open,
                            Ok(Event::Message(msg)) => {
                                LocationSseEvent::Message(msg)
                            }
                            Err(
                                reqwest_eventsource::Error::InvalidStatusCode(
                                    status,
                                    _,
                                ),
                            ) if status == StatusCode::UNAUTHORIZED => {
                                LocationSseEvent::Unauthorized
                            }
                            Err(e) => LocationSseEvent::Error(e.to_string()),
                        };

                        let stop = !matches!(
                            sse_event,
                            LocationSseEvent::Open | LocationSseEvent::Message(_)
                        );
                        if tx.send(sse_event).is_err() || stop {
                            event_source.close();
                            return;
                        }
                    }

                    let _ = tx.send(LocationSseEvent::Closed);
                }
                Err(err) => {
                    let _ = tx.send(LocationSseEvent::Error(err.to_string()));
                }
            }
        });

        self.task_handle = Some(task_handle);
    }

    /// Drop the connection and count the attempt. Returns `true` when the
    /// retry budget is exhausted.
    fn handle_connection_error(&mut self) -> bool {
        self.event_receiver = None;
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
        self.retry_count += 1;

        if self.retry_count > self.max_retries {
            log::error!("[LiveFeed] Max retries exceeded for location stream");
            return true;
        }
        false
    }
}

/// Decode one SSE message. Keepalives, other event names and malformed
/// payloads yield `None`.
pub(crate) fn decode_message(
    msg: &eventsource_stream::Event,
) -> Option<LocationEvent> {
    if msg.data == "keepalive" || msg.data.trim().is_empty() {
        log::debug!("[LiveFeed] Received keepalive");
        return None;
    }

    if msg.event != v1::events::RUNNER_LOCATION_EVENT {
        log::debug!(
            "[LiveFeed] Unknown event type: {} with data: {}",
            msg.event,
            msg.data
        );
        return None;
    }

    match serde_json::from_str::<LocationEvent>(&msg.data) {
        Ok(event) if event.is_anonymous() => {
            log::warn!("[LiveFeed] Location event without runner identity");
            None
        }
        Ok(event) => Some(event),
        Err(e) => {
            log::error!(
                "[LiveFeed] Failed to parse location event: {} - Data: {}",
                e,
                msg.data
            );
            None
        }
    }
}
