//! Property-based tests for the periodic sharing schedule.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use pairlink_client::{AutoSharer, MIN_SHARE_INTERVAL};
use proptest::prelude::*;

proptest! {
    /// Any interval below the floor is rejected; anything at or above it
    /// is accepted. Rejection leaves the schedule idle.
    #[test]
    fn floor_is_the_exact_acceptance_boundary(millis in 0u64..120_000) {
        let mut sharer = AutoSharer::new();
        let interval = Duration::from_millis(millis);
        let result = sharer.start(interval, Instant::now());

        if interval < MIN_SHARE_INTERVAL {
            prop_assert!(result.is_err());
            prop_assert!(!sharer.is_running());
        } else {
            prop_assert!(result.unwrap());
            prop_assert!(sharer.is_running());
        }
    }

    /// However irregular the tick pattern, the number of due shares over a
    /// window never exceeds one per interval plus the immediate first one.
    #[test]
    fn due_count_is_bounded_by_the_interval(
        interval_secs in 10u64..60,
        tick_gaps in proptest::collection::vec(0u64..30_000, 1..80),
    ) {
        let mut sharer = AutoSharer::new();
        let start = Instant::now();
        let interval = Duration::from_secs(interval_secs);
        sharer.start(interval, start).unwrap();

        let mut now = start;
        let mut due = 0u64;
        for gap in tick_gaps {
            now += Duration::from_millis(gap);
            if sharer.tick(now) {
                due += 1;
            }
        }

        let window = now - start;
        let bound = window.as_secs() / interval_secs + 1;
        prop_assert!(due <= bound, "{due} shares due in {window:?} at {interval:?}");
    }

    /// Ticks after stop never report a due share, whenever the stop lands.
    #[test]
    fn no_tick_fires_after_stop(
        ticks_before_stop in 0usize..20,
        gap_millis in 0u64..30_000,
    ) {
        let mut sharer = AutoSharer::new();
        let start = Instant::now();
        sharer.start(MIN_SHARE_INTERVAL, start).unwrap();

        let mut now = start;
        for _ in 0..ticks_before_stop {
            now += Duration::from_millis(gap_millis);
            sharer.tick(now);
        }

        sharer.stop();
        for _ in 0..10 {
            now += Duration::from_millis(gap_millis.max(1));
            prop_assert!(!sharer.tick(now));
        }
    }
}
