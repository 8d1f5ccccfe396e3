//! Session layer state machine.
//!
//! Manages the push-channel session lifecycle. Uses the action pattern:
//! methods take time as input and return actions for the driver to execute.
//! This keeps the state machine pure (no I/O) and makes testing
//! straightforward.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  connect   ┌────────────┐  handshake ok  ┌───────────┐
//! │ Disconnected │───────────>│ Connecting │───────────────>│ Connected │
//! └──────────────┘            └────────────┘                └───────────┘
//!        ↑                          │                             │
//!        │    handshake failure /   │       disconnect / error /  │
//!        │    timeout               ↓       remote close          ↓
//!        └──────────────────────────┴─────────────────────────────┘
//! ```
//!
//! There is no automatic reconnect. A dropped session surfaces as a state
//! change and the caller must re-issue `connect`; silent background
//! reconnection would hide data loss from the dual-transport delivery
//! guarantee, which assumes the caller knows liveness.

use std::time::{Duration, Instant};

use pairlink_proto::{RoomId, UserId, WireEvent};

use crate::error::ConnectionError;

/// Time allowed to complete the push-channel handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live session.
    Disconnected,
    /// Transport opening, handshake not yet settled.
    Connecting,
    /// Handshake complete, subscriptions live.
    Connected,
}

/// One of the three subscription scopes a live session maintains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionScope {
    /// Couple chat topic for the room.
    RoomChat(RoomId),
    /// Couple location topic for the room.
    RoomLocation(RoomId),
    /// Per-user private queue.
    PrivateQueue(UserId),
}

impl SubscriptionScope {
    /// Broker destination the driver subscribes to.
    pub fn destination(&self) -> String {
        match self {
            Self::RoomChat(room_id) => format!("/topic/chat/{room_id}"),
            Self::RoomLocation(room_id) => format!("/topic/location/{room_id}"),
            Self::PrivateQueue(_) => "/user/queue/messages".to_string(),
        }
    }
}

/// Actions returned by the connection state machine.
///
/// The driver executes these in emission order; the state machine performs
/// no I/O of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAction {
    /// Open the push-channel transport.
    Open,

    /// Subscribe to a scope. Emitted only after the handshake settles.
    Subscribe(SubscriptionScope),

    /// Send this event on the push channel.
    Send(WireEvent),

    /// Close the transport. Emitted at most once per session.
    Close,

    /// Show a transient user-visible notice.
    Notify {
        /// Notice text.
        text: String,
    },
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for completing the handshake.
    pub handshake_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT }
    }
}

/// Identity of the one live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SessionIdentity {
    room_id: RoomId,
    user_id: UserId,
}

/// Push-channel session state machine.
///
/// Owns the single live session per client instance: at most one session is
/// ever past Disconnected. Pure state machine; time is passed as a
/// parameter, and generic over `Instant` to support virtual time in tests.
#[derive(Debug, Clone)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>,
{
    state: SessionState,
    config: ConnectionConfig,
    session: Option<SessionIdentity>,
    connecting_since: Option<I>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>,
{
    /// Create a new connection in [`SessionState::Disconnected`].
    pub fn new(config: ConnectionConfig) -> Self {
        Self { state: SessionState::Disconnected, config, session: None, connecting_since: None }
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Room of the live session. `None` when disconnected.
    #[must_use]
    pub fn room_id(&self) -> Option<RoomId> {
        self.session.map(|s| s.room_id)
    }

    /// Local user of the live session. `None` when disconnected.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session.map(|s| s.user_id)
    }

    /// Begin a session. Valid only from Disconnected; transitions to
    /// Connecting synchronously and emits the `Open` action for the driver.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::AlreadyActive`] if a session is already live
    pub fn connect(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        now: I,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != SessionState::Disconnected {
            return Err(ConnectionError::AlreadyActive { state: self.state });
        }

        self.state = SessionState::Connecting;
        self.session = Some(SessionIdentity { room_id, user_id });
        self.connecting_since = Some(now);

        Ok(vec![ConnectionAction::Open])
    }

    /// Transport handshake settled successfully. Transitions to Connected
    /// and emits the three subscription scopes a live session maintains.
    ///
    /// Returns no actions when already Disconnected: a stale handshake
    /// that settles after `disconnect` is dropped, like the other
    /// transport callbacks.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::NotConnected`] if a session is already live
    pub fn handle_opened(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state == SessionState::Disconnected {
            return Ok(vec![]);
        }
        if self.state != SessionState::Connecting {
            return Err(ConnectionError::NotConnected {
                state: self.state,
                operation: "complete handshake",
            });
        }

        let Some(session) = self.session else {
            return Err(ConnectionError::NotConnected {
                state: self.state,
                operation: "complete handshake",
            });
        };

        self.state = SessionState::Connected;
        self.connecting_since = None;

        Ok(vec![
            ConnectionAction::Subscribe(SubscriptionScope::RoomChat(session.room_id)),
            ConnectionAction::Subscribe(SubscriptionScope::RoomLocation(session.room_id)),
            ConnectionAction::Subscribe(SubscriptionScope::PrivateQueue(session.user_id)),
            ConnectionAction::Notify { text: "Connected".to_string() },
        ])
    }

    /// Transport handshake failed. Transitions to Disconnected and emits a
    /// user-visible notice; never retried automatically.
    ///
    /// Returns no actions when already Disconnected: once a disconnect has
    /// settled, no further callbacks are surfaced.
    pub fn handle_handshake_failed(&mut self, reason: &str) -> Vec<ConnectionAction> {
        if self.state == SessionState::Disconnected {
            return vec![];
        }

        self.reset();
        vec![ConnectionAction::Notify {
            text: format!("Connection failed: {reason}. Please try again."),
        }]
    }

    /// Transport dropped or the server closed the session. Transitions to
    /// Disconnected; the caller decides whether to re-issue `connect`.
    pub fn handle_remote_close(&mut self, reason: &str) -> Vec<ConnectionAction> {
        if self.state == SessionState::Disconnected {
            return vec![];
        }

        self.reset();
        vec![ConnectionAction::Notify { text: format!("Disconnected: {reason}") }]
    }

    /// Send an event on the push channel.
    ///
    /// Fails immediately outside Connected: no queueing, no retry. Retries
    /// are a user action after reconnecting.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::NotConnected`] if state is not Connected
    pub fn send(&self, event: WireEvent) -> Result<ConnectionAction, ConnectionError> {
        if self.state != SessionState::Connected {
            return Err(ConnectionError::NotConnected { state: self.state, operation: "send" });
        }

        Ok(ConnectionAction::Send(event))
    }

    /// End the session. Valid from any state, always ends Disconnected,
    /// idempotent: the second call is a no-op and emits nothing.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        if self.state == SessionState::Disconnected {
            return vec![];
        }

        self.reset();
        vec![ConnectionAction::Close, ConnectionAction::Notify {
            text: "Disconnected".to_string(),
        }]
    }

    /// Periodic maintenance. Detects a handshake that never settled and
    /// abandons it with a notice.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        if self.state != SessionState::Connecting {
            return vec![];
        }

        let Some(since) = self.connecting_since else {
            return vec![];
        };

        let elapsed = now - since;
        if elapsed <= self.config.handshake_timeout {
            return vec![];
        }

        self.reset();
        vec![ConnectionAction::Close, ConnectionAction::Notify {
            text: format!("Connection timed out after {elapsed:?}. Please try again."),
        }]
    }

    fn reset(&mut self) {
        self.state = SessionState::Disconnected;
        self.session = None;
        self.connecting_since = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use pairlink_proto::EventId;

    use super::*;

    fn ids() -> (RoomId, UserId) {
        (RoomId::from_random_bytes([1; 16]), UserId::from_random_bytes([2; 16]))
    }

    fn chat_event(room_id: RoomId) -> WireEvent {
        WireEvent::Chat {
            id: EventId::from_random_bytes([3; 16]),
            room_id,
            sender_id: None,
            content: "hello".to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn connect_transitions_to_connecting_synchronously() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());

        assert_eq!(conn.state(), SessionState::Disconnected);

        let actions = conn.connect(room, user, Instant::now()).unwrap();
        assert_eq!(conn.state(), SessionState::Connecting);
        assert_eq!(actions, vec![ConnectionAction::Open]);
        assert_eq!(conn.room_id(), Some(room));
        assert_eq!(conn.user_id(), Some(user));
    }

    #[test]
    fn connect_is_rejected_outside_disconnected() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());

        conn.connect(room, user, Instant::now()).unwrap();
        let result = conn.connect(room, user, Instant::now());
        assert!(matches!(result, Err(ConnectionError::AlreadyActive { .. })));

        conn.handle_opened().unwrap();
        let result = conn.connect(room, user, Instant::now());
        assert!(matches!(result, Err(ConnectionError::AlreadyActive { .. })));
    }

    #[test]
    fn handshake_success_subscribes_three_scopes() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());

        conn.connect(room, user, Instant::now()).unwrap();
        let actions = conn.handle_opened().unwrap();

        assert_eq!(conn.state(), SessionState::Connected);
        let scopes: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                ConnectionAction::Subscribe(scope) => Some(scope.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(scopes, vec![
            SubscriptionScope::RoomChat(room),
            SubscriptionScope::RoomLocation(room),
            SubscriptionScope::PrivateQueue(user),
        ]);
    }

    #[test]
    fn stale_handshake_after_disconnect_is_dropped() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());

        conn.connect(room, user, Instant::now()).unwrap();
        conn.disconnect();

        // The transport settles after the session was already torn down.
        assert_eq!(conn.handle_opened().unwrap(), vec![]);
        assert_eq!(conn.state(), SessionState::Disconnected);
    }

    #[test]
    fn subscription_destinations() {
        let (room, user) = ids();
        assert_eq!(
            SubscriptionScope::RoomChat(room).destination(),
            format!("/topic/chat/{room}")
        );
        assert_eq!(
            SubscriptionScope::RoomLocation(room).destination(),
            format!("/topic/location/{room}")
        );
        assert_eq!(SubscriptionScope::PrivateQueue(user).destination(), "/user/queue/messages");
    }

    #[test]
    fn send_fails_while_connecting() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());
        conn.connect(room, user, Instant::now()).unwrap();

        let result = conn.send(chat_event(room));
        assert!(matches!(
            result,
            Err(ConnectionError::NotConnected { state: SessionState::Connecting, .. })
        ));
    }

    #[test]
    fn send_succeeds_while_connected() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());
        conn.connect(room, user, Instant::now()).unwrap();
        conn.handle_opened().unwrap();

        let action = conn.send(chat_event(room)).unwrap();
        assert!(matches!(action, ConnectionAction::Send(_)));
    }

    #[test]
    fn disconnect_is_idempotent_from_every_state() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());

        // From Disconnected: nothing happens
        assert!(conn.disconnect().is_empty());

        // From Connecting
        conn.connect(room, user, Instant::now()).unwrap();
        let actions = conn.disconnect();
        assert_eq!(conn.state(), SessionState::Disconnected);
        assert!(actions.contains(&ConnectionAction::Close));
        assert!(conn.disconnect().is_empty());

        // From Connected
        conn.connect(room, user, Instant::now()).unwrap();
        conn.handle_opened().unwrap();
        let actions = conn.disconnect();
        assert_eq!(conn.state(), SessionState::Disconnected);
        assert!(actions.contains(&ConnectionAction::Close));
        assert!(conn.disconnect().is_empty());
        assert_eq!(conn.room_id(), None);
    }

    #[test]
    fn handshake_failure_surfaces_notice_and_resets() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());
        conn.connect(room, user, Instant::now()).unwrap();

        let actions = conn.handle_handshake_failed("connection refused");
        assert_eq!(conn.state(), SessionState::Disconnected);
        assert!(matches!(actions[0], ConnectionAction::Notify { .. }));

        // After settling, no further callbacks
        assert!(conn.handle_handshake_failed("again").is_empty());
        assert!(conn.handle_remote_close("again").is_empty());
    }

    #[test]
    fn remote_close_resets_connected_session() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());
        conn.connect(room, user, Instant::now()).unwrap();
        conn.handle_opened().unwrap();

        let actions = conn.handle_remote_close("server shutdown");
        assert_eq!(conn.state(), SessionState::Disconnected);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn handshake_timeout_abandons_connect() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());
        let t0 = Instant::now();
        conn.connect(room, user, t0).unwrap();

        // Within the window: still connecting
        assert!(conn.tick(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(conn.state(), SessionState::Connecting);

        // Past the window: abandoned with a notice
        let actions = conn.tick(t0 + DEFAULT_HANDSHAKE_TIMEOUT + Duration::from_secs(1));
        assert_eq!(conn.state(), SessionState::Disconnected);
        assert!(actions.contains(&ConnectionAction::Close));
        assert!(actions.iter().any(|a| matches!(a, ConnectionAction::Notify { .. })));
    }

    #[test]
    fn tick_is_quiet_outside_connecting() {
        let (room, user) = ids();
        let mut conn: Connection = Connection::new(ConnectionConfig::default());
        let t0 = Instant::now();

        assert!(conn.tick(t0 + Duration::from_secs(60)).is_empty());

        conn.connect(room, user, t0).unwrap();
        conn.handle_opened().unwrap();
        assert!(conn.tick(t0 + Duration::from_secs(60)).is_empty());
        assert_eq!(conn.state(), SessionState::Connected);
    }
}
