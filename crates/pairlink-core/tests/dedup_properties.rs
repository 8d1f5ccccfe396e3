//! Property tests for the dedup ledger.
//!
//! These tests verify the central rendering invariant: for any identifier,
//! `should_render` returns true exactly once across any number of calls,
//! regardless of how calls for other identifiers interleave.

use std::collections::HashMap;

use pairlink_core::DedupLedger;
use pairlink_proto::EventId;
use proptest::prelude::*;

fn event_id(n: u8) -> EventId {
    EventId::from_random_bytes([n; 16])
}

proptest! {
    /// INVARIANT: each id renders exactly once under arbitrary interleaving,
    /// as long as the ledger never overflows its capacity.
    #[test]
    fn each_id_renders_exactly_once(calls in proptest::collection::vec(0u8..32, 1..200)) {
        let mut ledger = DedupLedger::new();
        let mut rendered: HashMap<u8, usize> = HashMap::new();

        for n in &calls {
            if ledger.should_render(Some(event_id(*n))) {
                *rendered.entry(*n).or_insert(0) += 1;
            }
        }

        for (n, count) in rendered {
            prop_assert_eq!(count, 1, "id {} rendered {} times", n, count);
        }
    }

    /// Id-less events never affect recorded ids and always render.
    #[test]
    fn id_less_calls_are_transparent(calls in proptest::collection::vec(
        proptest::option::of(0u8..16), 1..200,
    )) {
        let mut ledger = DedupLedger::new();

        for call in &calls {
            let rendered = ledger.should_render(call.map(event_id));
            if call.is_none() {
                prop_assert!(rendered, "id-less event must always render");
            }
        }

        let distinct = calls.iter().flatten().collect::<std::collections::HashSet<_>>();
        prop_assert_eq!(ledger.len(), distinct.len());
    }

    /// The ledger never retains more than its capacity.
    #[test]
    fn capacity_is_never_exceeded(cap in 1usize..32, calls in proptest::collection::vec(0u8..=255, 1..300)) {
        let mut ledger = DedupLedger::with_capacity(cap);

        for n in &calls {
            ledger.should_render(Some(event_id(*n)));
            prop_assert!(ledger.len() <= cap);
        }
    }
}
