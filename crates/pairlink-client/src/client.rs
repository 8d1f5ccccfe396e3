//! Top-level client state machine.

use pairlink_core::env::Environment;
use pairlink_core::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionError, DedupLedger, SessionState,
};
use pairlink_proto::{EventId, OutboundEvent, OutboundPayload, RoomId, UserId};

use crate::error::ClientError;
use crate::event::{ClientAction, ClientEvent, Direction, RenderEvent};
use crate::rest::BackupRequest;
use crate::sharer::{AcquireConfig, AutoSharer};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Room this client participates in.
    pub room_id: RoomId,
    /// Local user identity.
    pub user_id: UserId,
    /// Session layer configuration.
    pub connection: ConnectionConfig,
    /// Capacity of the receive-side dedup ledger.
    pub dedup_capacity: usize,
}

impl ClientConfig {
    /// Configuration with default timeouts and ledger capacity.
    pub fn new(room_id: RoomId, user_id: UserId) -> Self {
        Self {
            room_id,
            user_id,
            connection: ConnectionConfig::default(),
            dedup_capacity: pairlink_core::dedup::DEFAULT_CAPACITY,
        }
    }
}

/// State machine for one couple-chat session.
///
/// Owns the session lifecycle, the dual-transport delivery of outbound
/// events, the receive-side dedup ledger, and the periodic location
/// sharer. All methods are synchronous and non-blocking; every I/O effect
/// is returned as a [`ClientAction`] for the driver to execute in order.
///
/// Ordering matters within one `handle` call: actions are emitted in the
/// order they must run. Across calls, the caller must feed events in the
/// order they occurred.
#[derive(Debug, Clone)]
pub struct Client<E: Environment> {
    env: E,
    config: ClientConfig,
    connection: Connection<E::Instant>,
    ledger: DedupLedger,
    sharer: AutoSharer<E::Instant>,
    message_count: u64,
}

impl<E: Environment> Client<E> {
    /// Creates a disconnected client.
    pub fn new(env: E, config: ClientConfig) -> Self {
        let connection = Connection::new(config.connection.clone());
        let ledger = DedupLedger::with_capacity(config.dedup_capacity);
        Self { env, config, connection, ledger, sharer: AutoSharer::new(), message_count: 0 }
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.connection.state()
    }

    /// Number of chat and location events rendered so far. Incremented in
    /// the same `handle` call that emits the corresponding `Render`, never
    /// separately.
    #[must_use]
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Whether the periodic sharer is active.
    #[must_use]
    pub fn is_auto_sharing(&self) -> bool {
        self.sharer.is_running()
    }

    /// Acquisition parameters the driver should pass to its geolocation
    /// provider when resolving [`ClientAction::AcquireLocation`].
    #[must_use]
    pub fn acquire_config(&self) -> &AcquireConfig {
        self.sharer.acquire_config()
    }

    /// Processes one event, returning the actions to execute in order.
    ///
    /// # Errors
    ///
    /// An `Err` means the event was rejected before any effect: no action
    /// was emitted and no state changed. All variants map to a transient
    /// user notice.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Connect => {
                let now = self.env.now();
                let actions =
                    self.connection.connect(self.config.room_id, self.config.user_id, now)?;
                Ok(lift(actions))
            }

            ClientEvent::Disconnect => {
                let mut actions = lift(self.connection.disconnect());
                if self.sharer.is_running() {
                    self.sharer.stop();
                    actions.push(ClientAction::Log {
                        message: "location sharing stopped with the session".to_string(),
                    });
                }
                Ok(actions)
            }

            ClientEvent::TransportOpened => Ok(lift(self.connection.handle_opened()?)),

            ClientEvent::TransportFailed { reason } => {
                Ok(lift(self.connection.handle_handshake_failed(&reason)))
            }

            ClientEvent::RemoteClosed { reason } => {
                let mut actions = lift(self.connection.handle_remote_close(&reason));
                if self.sharer.is_running() {
                    self.sharer.stop();
                    actions.push(ClientAction::Log {
                        message: "location sharing stopped with the session".to_string(),
                    });
                }
                Ok(actions)
            }

            ClientEvent::EventReceived(wire) => Ok(self.handle_received(wire)),

            ClientEvent::SendChat { content } => {
                self.publish(OutboundPayload::Chat { content })
            }

            ClientEvent::ShareLocation { position, address } => {
                self.publish(OutboundPayload::Location { position, address })
            }

            ClientEvent::StartAutoShare { interval } => {
                if self.connection.state() != SessionState::Connected {
                    return Err(ClientError::Connection(ConnectionError::NotConnected {
                        state: self.connection.state(),
                        operation: "start location sharing",
                    }));
                }

                let now = self.env.now();
                if !self.sharer.start(interval, now)? {
                    return Ok(vec![ClientAction::Log {
                        message: "location sharing already active".to_string(),
                    }]);
                }

                // First share is due immediately
                let mut actions = vec![ClientAction::Notify {
                    text: "Location sharing started".to_string(),
                }];
                if self.sharer.tick(now) {
                    actions.push(ClientAction::AcquireLocation);
                }
                Ok(actions)
            }

            ClientEvent::StopAutoShare => {
                if !self.sharer.is_running() {
                    return Ok(vec![]);
                }
                self.sharer.stop();
                Ok(vec![ClientAction::Notify { text: "Location sharing stopped".to_string() }])
            }

            ClientEvent::FetchBacklog { page, size } => Ok(vec![ClientAction::PostBackup(
                BackupRequest::get_messages(self.config.room_id, page, size),
            )]),

            ClientEvent::MarkRead => Ok(vec![ClientAction::PostBackup(BackupRequest::mark_read(
                self.config.room_id,
            ))]),

            ClientEvent::FetchUnreadCount => Ok(vec![ClientAction::PostBackup(
                BackupRequest::get_unread_count(self.config.room_id),
            )]),

            ClientEvent::FetchLatestLocations => Ok(vec![ClientAction::PostBackup(
                BackupRequest::get_latest_locations(self.config.room_id),
            )]),

            ClientEvent::FetchLocationHistory { page, size } => Ok(vec![ClientAction::PostBackup(
                BackupRequest::get_location_history(self.config.room_id, page, size),
            )]),

            ClientEvent::UnreadCount { count } => {
                Ok(vec![ClientAction::Render(RenderEvent::System {
                    text: format!("Unread messages: {count}"),
                })])
            }

            ClientEvent::Tick { now } => {
                let mut actions = lift(self.connection.tick(now));
                if self.sharer.tick(now) {
                    actions.push(ClientAction::AcquireLocation);
                }
                Ok(actions)
            }

            ClientEvent::LocationAcquired { position } => {
                // A fix resolved after stop must not be published
                if !self.sharer.is_running() {
                    return Ok(vec![ClientAction::Log {
                        message: "dropped location fix: sharing no longer active".to_string(),
                    }]);
                }

                if self.connection.state() != SessionState::Connected {
                    self.sharer.stop();
                    return Ok(vec![ClientAction::Notify {
                        text: "Location sharing stopped: not connected".to_string(),
                    }]);
                }

                self.publish(OutboundPayload::Location { position, address: None })
            }

            ClientEvent::LocationFailed { reason } => {
                if !self.sharer.is_running() {
                    return Ok(vec![ClientAction::Log {
                        message: format!("location acquisition failed while idle: {reason}"),
                    }]);
                }
                self.sharer.stop();
                Ok(vec![ClientAction::Notify {
                    text: format!("Location sharing stopped: {reason}"),
                }])
            }

            // Delivery backups (id present) are duplicates of something the
            // push channel already carried: log only, never escalate. A
            // failed fetch (id absent) means the user asked for data they
            // did not get, so it also surfaces a notice.
            ClientEvent::BackupSettled { id, result } => Ok(match (id, result) {
                (Some(id), Ok(())) => vec![ClientAction::Log {
                    message: format!("backup delivery settled for {id}"),
                }],
                (Some(id), Err(reason)) => vec![ClientAction::Log {
                    message: format!("backup delivery failed for {id}: {reason}"),
                }],
                (None, Ok(())) => vec![ClientAction::Log {
                    message: "sync request settled".to_string(),
                }],
                (None, Err(reason)) => vec![
                    ClientAction::Log { message: format!("sync request failed: {reason}") },
                    ClientAction::Notify { text: "Could not reach the server".to_string() },
                ],
            }),
        }
    }

    /// Dual-transport delivery of a locally created event.
    ///
    /// The primary send is validated first: outside Connected this is a
    /// pure error and neither leg runs. Once admitted, the same identifier
    /// travels on both legs and is recorded in the ledger before the
    /// optimistic render, so the broadcast echo is suppressed.
    fn publish(&mut self, payload: OutboundPayload) -> Result<Vec<ClientAction>, ClientError> {
        let event = OutboundEvent {
            id: EventId::from_random_bytes(self.env.random_id_bytes()),
            room_id: self.config.room_id,
            payload,
            timestamp: self.env.unix_millis(),
        };
        let wire = event.to_wire();

        let primary = self.connection.send(wire)?;

        let backup = match &event.payload {
            OutboundPayload::Chat { .. } => BackupRequest::post_message(&event),
            OutboundPayload::Location { .. } => BackupRequest::post_location(&event),
        };

        let mut actions = vec![lift_one(primary), ClientAction::PostBackup(backup)];
        if self.ledger.should_render(Some(event.id)) {
            actions.push(self.render_outbound(&event));
        }
        Ok(actions)
    }

    /// Render of a locally created event. Counted like any other bubble.
    fn render_outbound(&mut self, event: &OutboundEvent) -> ClientAction {
        self.message_count += 1;
        let render = match &event.payload {
            OutboundPayload::Chat { content } => RenderEvent::Chat {
                direction: Direction::Sent,
                content: content.clone(),
                timestamp: event.timestamp,
            },
            OutboundPayload::Location { position, address } => RenderEvent::Location {
                direction: Direction::Sent,
                latitude: position.latitude,
                longitude: position.longitude,
                accuracy: position.accuracy,
                address: address.clone(),
            },
        };
        ClientAction::Render(render)
    }

    /// Inbound event from any subscription scope or a backlog fetch.
    ///
    /// The ledger is consulted exactly once per event, so the first
    /// arrival renders and every later one is dropped, regardless of which
    /// transport carried it.
    fn handle_received(&mut self, wire: pairlink_proto::WireEvent) -> Vec<ClientAction> {
        use pairlink_proto::WireEvent;

        if !self.ledger.should_render(wire.event_id()) {
            return vec![ClientAction::Log {
                message: "dropped duplicate delivery".to_string(),
            }];
        }

        let direction = if wire.sender_id() == Some(self.config.user_id) {
            Direction::Sent
        } else {
            Direction::Received
        };

        match wire {
            WireEvent::Chat { content, timestamp, .. } => {
                self.message_count += 1;
                vec![ClientAction::Render(RenderEvent::Chat { direction, content, timestamp })]
            }
            WireEvent::Location { latitude, longitude, accuracy, address, .. } => {
                self.message_count += 1;
                vec![ClientAction::Render(RenderEvent::Location {
                    direction,
                    latitude,
                    longitude,
                    accuracy,
                    address,
                })]
            }
            WireEvent::System { text } => {
                vec![ClientAction::Render(RenderEvent::System { text })]
            }
            WireEvent::Connected { session } => {
                vec![ClientAction::Log { message: format!("session acknowledged: {session}") }]
            }
            WireEvent::Error { reason } => {
                vec![ClientAction::Notify { text: format!("Server error: {reason}") }]
            }
            WireEvent::Pong => vec![],
        }
    }
}

fn lift(actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
    actions.into_iter().map(lift_one).collect()
}

fn lift_one(action: ConnectionAction) -> ClientAction {
    match action {
        ConnectionAction::Open => ClientAction::Open,
        ConnectionAction::Subscribe(scope) => ClientAction::Subscribe(scope),
        ConnectionAction::Send(event) => ClientAction::SendPrimary(event),
        ConnectionAction::Close => ClientAction::Close,
        ConnectionAction::Notify { text } => ClientAction::Notify { text },
    }
}
