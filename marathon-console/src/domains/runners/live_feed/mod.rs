//! Live runner location feed
//!
//! Out-of-band location/status events keyed by runner identity. Delivery is
//! best-effort and at-most-once, in delivery order, with no ordering
//! guarantee relative to list fetches.

pub mod hub;
pub mod sse;

pub use hub::LocationHub;
pub use sse::SseLocationFeed;

use marathon_core::console_prelude::LocationEvent;
use std::fmt::{self, Debug};
use tokio::sync::mpsc;

/// Handle identifying one subscriber of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        SubscriptionId(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a subscription
#[derive(Debug)]
pub struct LocationSubscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<LocationEvent>,
}

impl LocationSubscription {
    pub fn new(
        id: SubscriptionId,
        receiver: mpsc::UnboundedReceiver<LocationEvent>,
    ) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event; `None` once the feed has dropped this subscriber
    pub async fn recv(&mut self) -> Option<LocationEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<LocationEvent> {
        self.receiver.try_recv().ok()
    }
}

pub trait LiveLocationFeed: Send + Sync + Debug {
    fn subscribe(&self) -> LocationSubscription;

    /// Stop delivering to `id`. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
