//! Fuzz target for the Connection state machine
//!
//! # Strategy
//!
//! - Arbitrary operation sequences: connect, handshake outcomes, sends,
//!   disconnects, remote closes, and clock advances in any order
//! - Clock advances past and short of the handshake timeout
//!
//! # Invariants
//!
//! - The machine never panics and never leaves the three named states
//! - `connect` succeeds only from Disconnected
//! - `send` succeeds exactly when Connected
//! - Once Disconnected, failure callbacks emit nothing
//! - Session identity is present exactly when a session is live

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pairlink_core::{Connection, ConnectionConfig, SessionState};
use pairlink_proto::{EventId, RoomId, UserId, WireEvent};

#[derive(Debug, Clone, Arbitrary)]
enum ConnectionOp {
    Connect,
    HandshakeOk,
    HandshakeFailed,
    RemoteClose,
    Send,
    Disconnect,
    Advance { millis: u32 },
    Tick,
}

fuzz_target!(|ops: Vec<ConnectionOp>| {
    let mut conn: Connection = Connection::new(ConnectionConfig::default());
    let mut now = Instant::now();
    let room = RoomId::from_random_bytes([1; 16]);
    let user = UserId::from_random_bytes([2; 16]);

    for op in ops {
        let state_before = conn.state();
        match op {
            ConnectionOp::Connect => {
                let result = conn.connect(room, user, now);
                assert_eq!(result.is_ok(), state_before == SessionState::Disconnected);
            }
            ConnectionOp::HandshakeOk => {
                let result = conn.handle_opened();
                assert_eq!(result.is_ok(), state_before == SessionState::Connecting);
            }
            ConnectionOp::HandshakeFailed => {
                let actions = conn.handle_handshake_failed("fuzz");
                if state_before == SessionState::Disconnected {
                    assert!(actions.is_empty());
                }
                assert_eq!(conn.state(), SessionState::Disconnected);
            }
            ConnectionOp::RemoteClose => {
                let actions = conn.handle_remote_close("fuzz");
                if state_before == SessionState::Disconnected {
                    assert!(actions.is_empty());
                }
                assert_eq!(conn.state(), SessionState::Disconnected);
            }
            ConnectionOp::Send => {
                let event = WireEvent::Chat {
                    id: EventId::from_random_bytes([3; 16]),
                    room_id: room,
                    sender_id: None,
                    content: "fuzz".to_string(),
                    timestamp: 0,
                };
                let result = conn.send(event);
                assert_eq!(result.is_ok(), state_before == SessionState::Connected);
            }
            ConnectionOp::Disconnect => {
                conn.disconnect();
                assert_eq!(conn.state(), SessionState::Disconnected);
                assert!(conn.disconnect().is_empty());
            }
            ConnectionOp::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis));
            }
            ConnectionOp::Tick => {
                conn.tick(now);
            }
        }

        // Session identity tracks liveness exactly
        match conn.state() {
            SessionState::Disconnected => assert!(conn.room_id().is_none()),
            SessionState::Connecting | SessionState::Connected => {
                assert_eq!(conn.room_id(), Some(room));
                assert_eq!(conn.user_id(), Some(user));
            }
        }
    }
});
