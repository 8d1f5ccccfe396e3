//! Error types for the connection layer.
//!
//! Strongly-typed errors instead of `std::io::Error` so callers can
//! distinguish locally recoverable conditions (send while disconnected)
//! from handshake and transport failures.

use std::{io, time::Duration};

use thiserror::Error;

use crate::connection::SessionState;

/// Errors that can occur during connection state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Send or subscribe attempted outside the Connected state.
    ///
    /// Locally recoverable: the caller retries after reconnecting. Nothing
    /// is queued on their behalf.
    #[error("not connected: cannot {operation} in state {state:?}")]
    NotConnected {
        /// State when the operation was attempted.
        state: SessionState,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// `connect` attempted while a session is already live.
    #[error("session already active in state {state:?}")]
    AlreadyActive {
        /// State when connect was attempted.
        state: SessionState,
    },

    /// Push channel handshake failed. Surfaces as a state change plus a
    /// user-visible notice; never retried automatically.
    #[error("handshake failed: {reason}")]
    HandshakeFailed {
        /// Transport-reported reason.
        reason: String,
    },

    /// Handshake did not complete within the configured timeout.
    #[error("handshake timeout after {elapsed:?}")]
    HandshakeTimeout {
        /// How long we waited.
        elapsed: Duration,
    },

    /// Underlying transport error.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ConnectionError {
    /// Whether retrying (after the user re-issues connect) may succeed.
    ///
    /// Send-while-disconnected and timeouts are transient; a handshake the
    /// server rejected is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. } | Self::HandshakeTimeout { .. } | Self::Transport(_)
        )
    }
}

impl From<ConnectionError> for io::Error {
    fn from(err: ConnectionError) -> Self {
        let kind = match &err {
            ConnectionError::HandshakeTimeout { .. } => io::ErrorKind::TimedOut,
            ConnectionError::NotConnected { .. } => io::ErrorKind::NotConnected,
            ConnectionError::AlreadyActive { .. } => io::ErrorKind::AlreadyExists,
            ConnectionError::HandshakeFailed { .. } => io::ErrorKind::ConnectionRefused,
            ConnectionError::Transport(_) => io::ErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}
