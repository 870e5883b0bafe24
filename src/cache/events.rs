//! Cache event journal.
//!
//! Every fetch transition, invalidation and mutation outcome is recorded here
//! with a monotonic epoch. The journal is bounded; the oldest events are
//! dropped first.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::invalidation::InvalidationScope;
use super::keys::CacheKey;
use super::lock::lock;

const SOURCE: &str = "cache::events";
const METRIC_EVENT_DROPPED_TOTAL: &str = "loumo_cache_event_dropped_total";

/// Monotonic epoch ordering events within this process.
pub type Epoch = u64;

/// One journal record.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    // Fetch lifecycle
    FetchStarted { key: CacheKey, sequence: u64 },
    FetchApplied { key: CacheKey, sequence: u64 },
    FetchFailed {
        key: CacheKey,
        sequence: u64,
        error: String,
    },
    /// A result arrived for a sequence that is no longer the latest.
    FetchSuperseded { key: CacheKey, sequence: u64 },
    RetryScheduled { key: CacheKey, attempt: u32 },

    // Invalidation
    Invalidated {
        prefixes: Vec<CacheKey>,
        scope: InvalidationScope,
        refetched: Vec<CacheKey>,
    },
    Evicted { key: CacheKey },

    // Mutations
    MutationSucceeded { name: String },
    MutationFailed { name: String, error: String },
}

impl EventKind {
    /// Key the event is about, when it concerns a single entry.
    pub fn key(&self) -> Option<&CacheKey> {
        match self {
            Self::FetchStarted { key, .. }
            | Self::FetchApplied { key, .. }
            | Self::FetchFailed { key, .. }
            | Self::FetchSuperseded { key, .. }
            | Self::RetryScheduled { key, .. }
            | Self::Evicted { key } => Some(key),
            Self::Invalidated { .. } | Self::MutationSucceeded { .. } | Self::MutationFailed { .. } => {
                None
            }
        }
    }
}

/// Bounded in-memory event journal.
pub struct EventLog {
    events: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
    limit: NonZeroUsize,
}

impl EventLog {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
            limit,
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Append an event, dropping the oldest one when the journal is full.
    pub fn publish(&self, kind: EventKind) -> Epoch {
        let epoch = self.next_epoch();
        let event = CacheEvent::new(kind, epoch);

        debug!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            "Cache event recorded"
        );

        let mut events = lock(&self.events, SOURCE, "publish");
        if events.len() >= self.limit.get() {
            events.pop_front();
            counter!(METRIC_EVENT_DROPPED_TOTAL).increment(1);
        }
        events.push_back(event);
        epoch
    }

    /// Remove and return up to `limit` events, oldest first.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut events = lock(&self.events, SOURCE, "drain");
        let count = limit.min(events.len());
        events.drain(..count).collect()
    }

    /// Copy of the retained events, oldest first.
    pub fn snapshot(&self) -> Vec<CacheEvent> {
        lock(&self.events, SOURCE, "snapshot")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.events, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.events, SOURCE, "clear").clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN))
    }
}
