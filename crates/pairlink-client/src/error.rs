//! Client error types.

use std::time::Duration;

use pairlink_core::ConnectionError;
use thiserror::Error;

/// Errors surfaced synchronously by [`crate::Client::handle`].
///
/// None of these is fatal to the client process: every variant maps to a
/// transient user notice. Handshake failures, location acquisition
/// failures, and backup-leg failures are not errors here at all; they
/// surface through state changes and actions instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connection layer rejected the operation.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Requested sharing interval is below the floor. Rejected at call
    /// time, never silently clamped.
    #[error("share interval {requested:?} is below the {floor:?} floor")]
    BelowFloor {
        /// Interval the caller asked for.
        requested: Duration,
        /// Minimum permitted interval.
        floor: Duration,
    },
}
