//! Fuzz target for the dedup ledger
//!
//! # Strategy
//!
//! - Arbitrary id streams drawn from a small alphabet to force collisions
//! - Tiny capacities, including zero, to force constant eviction
//!
//! # Invariants
//!
//! - Never panics
//! - A retained id never renders twice
//! - The ledger never exceeds its capacity
//! - Id-less events always render and are never recorded

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pairlink_core::DedupLedger;
use pairlink_proto::EventId;

#[derive(Debug, Clone, Arbitrary)]
struct Input {
    capacity: u8,
    stream: Vec<Option<u8>>,
}

fuzz_target!(|input: Input| {
    let capacity = usize::from(input.capacity);
    let mut ledger = DedupLedger::with_capacity(capacity);
    let mut rendered: HashSet<EventId> = HashSet::new();

    for slot in input.stream {
        let id = slot.map(|n| EventId::from_random_bytes([n; 16]));
        let render = ledger.should_render(id);

        match id {
            None => assert!(render),
            Some(id) => {
                if render && capacity > 0 {
                    // While an id is retained it must not render again;
                    // eviction legitimately clears that memory, so only
                    // check ids the ledger still holds.
                    assert!(ledger.has_seen(id));
                    rendered.insert(id);
                } else if !render {
                    assert!(rendered.contains(&id));
                }
            }
        }

        if capacity > 0 {
            assert!(ledger.len() <= capacity);
        } else {
            assert!(ledger.is_empty());
        }
    }
});
