//! Bounded log of live events received while a list fetch is in flight.

use marathon_core::console_prelude::LocationEvent;
use std::collections::VecDeque;

pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// Logical-clock tick at which the event was received
    pub received_at: u64,
    pub event: LocationEvent,
}

#[derive(Debug, Clone)]
pub struct EventJournal {
    capacity: usize,
    entries: VecDeque<JournalEntry>,
    dropped: u64,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl EventJournal {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(64)),
            dropped: 0,
        }
    }

    /// Append an event, evicting the oldest entry when full.
    ///
    /// Returns `true` if something had to be dropped.
    pub fn record(&mut self, received_at: u64, event: LocationEvent) -> bool {
        if self.capacity == 0 {
            self.dropped += 1;
            return true;
        }

        let mut evicted = false;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
            evicted = true;
        }
        if evicted {
            log::warn!(
                "[Runners] Event journal full ({} entries), dropped oldest event",
                self.capacity
            );
        }

        self.entries.push_back(JournalEntry { received_at, event });
        evicted
    }

    /// Take every event received strictly after `tick`, oldest first, and
    /// empty the journal.
    pub fn drain_after(&mut self, tick: u64) -> Vec<LocationEvent> {
        self.entries
            .drain(..)
            .filter(|entry| entry.received_at > tick)
            .map(|entry| entry.event)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events lost to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
