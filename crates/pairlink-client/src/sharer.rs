//! Periodic location sharing schedule.
//!
//! [`AutoSharer`] is a pure schedule: it decides *when* a location
//! acquisition is due, and the client turns that into an
//! [`AcquireLocation`](crate::ClientAction::AcquireLocation) action. The
//! actual fix comes back later as a
//! [`LocationAcquired`](crate::ClientEvent::LocationAcquired) event, so
//! stopping the schedule must also invalidate fixes still in flight: the
//! client checks [`AutoSharer::is_running`] before publishing.

use std::ops::{Add, Sub};
use std::time::Duration;

use pairlink_proto::GeoPosition;

use crate::error::ClientError;

/// Smallest interval the schedule accepts.
///
/// Each due tick costs a position fix plus two publishes, so the floor is
/// enforced at start time rather than clamped silently.
pub const MIN_SHARE_INTERVAL: Duration = Duration::from_secs(10);

/// How a position fix should be acquired.
///
/// Mirrors the knobs a platform geolocation API exposes. The driver that
/// executes `AcquireLocation` applies these; the schedule itself never
/// waits on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireConfig {
    /// Give up on a fix after this long.
    pub timeout: Duration,
    /// A cached fix no older than this is acceptable.
    pub max_age: Duration,
    /// Request the most precise source available.
    pub high_accuracy: bool,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_age: Duration::from_secs(30),
            high_accuracy: true,
        }
    }
}

/// Source of position fixes for the transport driver.
///
/// Implemented over whatever the platform offers (a geolocation API, a
/// GPS daemon, a fixture in tests). Drivers feed the result back as
/// `LocationAcquired` or `LocationFailed`.
pub trait LocationProvider {
    /// Error produced when no fix could be obtained.
    type Error: std::fmt::Display;

    /// Obtain one position fix under the given constraints.
    fn acquire(&mut self, config: &AcquireConfig) -> Result<GeoPosition, Self::Error>;
}

/// Interval schedule for automatic location sharing.
///
/// At most one schedule is active at a time. Starting an active schedule
/// is a no-op, stopping is idempotent, and a failed acquisition stops the
/// schedule entirely rather than silently skipping a beat.
#[derive(Debug, Clone)]
pub struct AutoSharer<I> {
    interval: Duration,
    acquire: AcquireConfig,
    next_due: Option<I>,
}

impl<I> AutoSharer<I>
where
    I: Copy + Ord + Sub<I, Output = Duration> + Add<Duration, Output = I>,
{
    /// Creates an idle schedule.
    pub fn new() -> Self {
        Self {
            interval: MIN_SHARE_INTERVAL,
            acquire: AcquireConfig::default(),
            next_due: None,
        }
    }

    /// Starts the schedule with the first share due immediately.
    ///
    /// Returns `Ok(true)` when the schedule was started, `Ok(false)` when
    /// one is already running (the existing cadence is kept), and
    /// [`ClientError::BelowFloor`] when `interval` is under
    /// [`MIN_SHARE_INTERVAL`].
    pub fn start(&mut self, interval: Duration, now: I) -> Result<bool, ClientError> {
        if interval < MIN_SHARE_INTERVAL {
            return Err(ClientError::BelowFloor { requested: interval, floor: MIN_SHARE_INTERVAL });
        }
        if self.next_due.is_some() {
            return Ok(false);
        }
        self.interval = interval;
        self.next_due = Some(now);
        Ok(true)
    }

    /// Stops the schedule.
    ///
    /// Takes effect immediately: a fix that arrives after this call must
    /// not be published. Idempotent.
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// Whether the schedule is active.
    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Acquisition constraints for due shares.
    pub fn acquire_config(&self) -> &AcquireConfig {
        &self.acquire
    }

    /// Advances the schedule, returning whether a share is due.
    ///
    /// When due, the next deadline is set before returning so a slow
    /// acquisition cannot cause a second concurrent one.
    pub fn tick(&mut self, now: I) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

impl<I> Default for AutoSharer<I>
where
    I: Copy + Ord + Sub<I, Output = Duration> + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn first_share_is_due_immediately() {
        let mut sharer = AutoSharer::new();
        let now = Instant::now();

        assert!(sharer.start(Duration::from_secs(10), now).unwrap());
        assert!(sharer.tick(now));
        assert!(!sharer.tick(now));
    }

    #[test]
    fn interval_below_floor_is_rejected_without_starting() {
        let mut sharer = AutoSharer::<Instant>::new();
        let now = Instant::now();

        let err = sharer.start(Duration::from_secs(3), now).unwrap_err();
        assert!(matches!(err, ClientError::BelowFloor { .. }));
        assert!(!sharer.is_running());
    }

    #[test]
    fn starting_twice_keeps_the_first_cadence() {
        let mut sharer = AutoSharer::new();
        let now = Instant::now();

        assert!(sharer.start(Duration::from_secs(10), now).unwrap());
        assert!(!sharer.start(Duration::from_secs(60), now).unwrap());

        assert!(sharer.tick(now));
        // Still on the 10s cadence, not 60s.
        assert!(sharer.tick(now + Duration::from_secs(10)));
    }

    #[test]
    fn due_ticks_repeat_on_the_interval() {
        let mut sharer = AutoSharer::new();
        let now = Instant::now();
        sharer.start(Duration::from_secs(10), now).unwrap();

        assert!(sharer.tick(now));
        assert!(!sharer.tick(now + Duration::from_secs(9)));
        assert!(sharer.tick(now + Duration::from_secs(10)));
        assert!(sharer.tick(now + Duration::from_secs(25)));
    }

    #[test]
    fn stop_is_immediate_and_idempotent() {
        let mut sharer = AutoSharer::new();
        let now = Instant::now();
        sharer.start(Duration::from_secs(10), now).unwrap();

        sharer.stop();
        sharer.stop();
        assert!(!sharer.is_running());
        assert!(!sharer.tick(now + Duration::from_secs(60)));
    }

    #[test]
    fn acquire_config_matches_platform_defaults() {
        struct FixedProvider(GeoPosition);

        impl LocationProvider for FixedProvider {
            type Error = String;

            fn acquire(&mut self, config: &AcquireConfig) -> Result<GeoPosition, String> {
                assert_eq!(config.timeout, Duration::from_secs(10));
                assert_eq!(config.max_age, Duration::from_secs(30));
                assert!(config.high_accuracy);
                Ok(self.0)
            }
        }

        let sharer = AutoSharer::<Instant>::new();
        let position = GeoPosition { latitude: 1.0, longitude: 2.0, accuracy: 3.0 };
        let mut provider = FixedProvider(position);
        assert_eq!(provider.acquire(sharer.acquire_config()).unwrap(), position);
    }

    #[test]
    fn restart_after_stop_is_allowed() {
        let mut sharer = AutoSharer::new();
        let now = Instant::now();
        sharer.start(Duration::from_secs(10), now).unwrap();
        sharer.stop();

        assert!(sharer.start(Duration::from_secs(30), now).unwrap());
        assert!(sharer.tick(now));
    }
}
