use super::{LiveLocationFeed, LocationSubscription, SubscriptionId};

use marathon_core::console_prelude::LocationEvent;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// In-process fan-out of location events to every current subscriber
#[derive(Debug, Clone, Default)]
pub struct LocationHub {
    inner: Arc<Mutex<HubInner>>,
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: u64,
    /// Set once the upstream source is gone
    closed: bool,
    subscribers: BTreeMap<SubscriptionId, mpsc::UnboundedSender<LocationEvent>>,
}

impl LocationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to all subscribers; returns how many received it.
    ///
    /// Subscribers whose receiver is gone are pruned here.
    pub fn publish(&self, event: LocationEvent) -> usize {
        let mut inner = self.inner.lock();
        let mut delivered = 0;
        inner.subscribers.retain(|id, sender| {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                log::debug!("[LiveFeed] Pruning closed subscriber {}", id);
                false
            }
        });
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// End every subscription: receivers drain what is queued, then see
    /// `None`. Later subscribers are closed immediately.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        let dropped = std::mem::take(&mut inner.subscribers).len();
        log::info!("[LiveFeed] Hub closed, {} subscribers released", dropped);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

impl LiveLocationFeed for LocationHub {
    fn subscribe(&self) -> LocationSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = SubscriptionId::new(inner.next_id);
        if inner.closed {
            log::debug!("[LiveFeed] {} subscribed to a closed hub", id);
            return LocationSubscription::new(id, rx);
        }
        inner.subscribers.insert(id, tx);
        log::debug!("[LiveFeed] {} subscribed", id);
        LocationSubscription::new(id, rx)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.inner.lock().subscribers.remove(&id).is_some() {
            log::debug!("[LiveFeed] {} unsubscribed", id);
        }
    }
}
