//! Seen-identifier ledger gating exactly-once rendering.
//!
//! The same logical event can arrive several times: as the local optimistic
//! render when the sender transmits, again when the broadcast topic fans the
//! event back to its own sender, and once more from a REST backlog fetch.
//! The ledger is the single authority that an identifier is rendered exactly
//! once regardless of arrival order or transport multiplicity.

use std::collections::{HashSet, VecDeque};

use pairlink_proto::EventId;

/// Default ledger capacity.
///
/// The source this layer replaces never evicted, which is unbounded memory
/// over a long-lived session. A FIFO cap bounds growth instead; an id older
/// than the newest `capacity` entries can be rendered a second time if it is
/// replayed, which is an accepted semantics change.
pub const DEFAULT_CAPACITY: usize = 8192;

/// Process-lifetime set of already-rendered event identifiers.
#[derive(Debug, Clone)]
pub struct DedupLedger {
    seen: HashSet<EventId>,
    order: VecDeque<EventId>,
    capacity: usize,
}

impl Default for DedupLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupLedger {
    /// Create with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create with an explicit capacity. A capacity of zero disables
    /// deduplication entirely (every event renders).
    pub fn with_capacity(capacity: usize) -> Self {
        Self { seen: HashSet::new(), order: VecDeque::new(), capacity }
    }

    /// Whether an event with this identifier should be rendered.
    ///
    /// First call with a given id returns true and records it; every later
    /// call with the same id returns false. `None` bypasses the ledger:
    /// id-less events are transient, never retransmitted, and always
    /// rendered.
    pub fn should_render(&mut self, id: Option<EventId>) -> bool {
        let Some(id) = id else {
            return true;
        };

        if self.capacity == 0 {
            return true;
        }

        if !self.seen.insert(id) {
            return false;
        }

        self.order.push_back(id);
        if self.order.len() > self.capacity {
            // Evict oldest; a replay of that id would render again
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        true
    }

    /// Whether an identifier has been recorded, without recording it.
    #[must_use]
    pub fn has_seen(&self, id: EventId) -> bool {
        self.seen.contains(&id)
    }

    /// Number of identifiers currently recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no identifier has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of identifiers retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
