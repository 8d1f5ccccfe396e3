//! Client events and actions.

use std::time::Duration;

use pairlink_core::SubscriptionScope;
use pairlink_proto::{EventId, GeoPosition, WireEvent};

use crate::rest::BackupRequest;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Receiving wire events from the push channel
/// - Driving time forward via ticks
/// - Resolving geolocation requests and feeding the result back
/// - Forwarding application intents (send chat, share location, etc.)
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and virtual-time test environments.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// Application wants to open the session.
    Connect,

    /// Application wants to end the session.
    Disconnect,

    /// Push-channel handshake settled successfully.
    TransportOpened,

    /// Push-channel handshake failed.
    TransportFailed {
        /// Transport-reported reason.
        reason: String,
    },

    /// The transport dropped or the server closed the session.
    RemoteClosed {
        /// Close reason.
        reason: String,
    },

    /// Wire event received on any subscription scope.
    EventReceived(WireEvent),

    /// Application wants to send a chat message.
    SendChat {
        /// Message text.
        content: String,
    },

    /// Application wants to share a location once. The position was already
    /// acquired by the caller (manual entry or a one-shot lookup).
    ShareLocation {
        /// Device position.
        position: GeoPosition,
        /// Human-readable address, when known.
        address: Option<String>,
    },

    /// Application wants to start periodic location sharing.
    StartAutoShare {
        /// Requested repeat interval. Rejected below the floor.
        interval: Duration,
    },

    /// Application wants to stop periodic location sharing.
    StopAutoShare,

    /// Application wants a page of the room's message backlog. The driver
    /// feeds each returned event back as [`ClientEvent::EventReceived`];
    /// the ledger drops the ones already rendered.
    FetchBacklog {
        /// Zero-based page index.
        page: u32,
        /// Page size.
        size: u32,
    },

    /// Application wants the room's messages marked read.
    MarkRead,

    /// Application wants the local user's unread message count. The driver
    /// feeds the decoded count back as [`ClientEvent::UnreadCount`].
    FetchUnreadCount,

    /// Application wants the couple's latest known locations.
    FetchLatestLocations,

    /// Application wants a page of the couple's location history.
    FetchLocationHistory {
        /// Zero-based page index.
        page: u32,
        /// Page size.
        size: u32,
    },

    /// Driver decoded an unread-count response body. Surfaced as a
    /// transient system line.
    UnreadCount {
        /// Number of unread messages.
        count: u64,
    },

    /// Time tick for timeout processing and sharer scheduling.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// Geolocation provider resolved an [`ClientAction::AcquireLocation`]
    /// request.
    LocationAcquired {
        /// Device position.
        position: GeoPosition,
    },

    /// Geolocation provider failed (denial, timeout). One failure disables
    /// the periodic sharer.
    LocationFailed {
        /// Provider-reported reason.
        reason: String,
    },

    /// Backup-leg send settled. Diagnostics only: the result never blocks
    /// or retries the primary path.
    BackupSettled {
        /// Event the backup leg carried, when it carried one.
        id: Option<EventId>,
        /// Outcome, `Err` holds the transport-reported reason.
        result: Result<(), String>,
    },
}

/// Who produced a rendered event, relative to the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The local user.
    Sent,
    /// The peer.
    Received,
}

/// What the render sink consumes.
///
/// One `Render` action is exactly one counted message: the render and its
/// counter increment happen as a unit, never one without the other.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// A chat message bubble.
    Chat {
        /// Sender relative to the local user.
        direction: Direction,
        /// Message text.
        content: String,
        /// Unix milliseconds at creation.
        timestamp: u64,
    },

    /// A shared location bubble.
    Location {
        /// Sender relative to the local user.
        direction: Direction,
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
        /// Reported accuracy in meters.
        accuracy: f64,
        /// Human-readable address, when known.
        address: Option<String>,
    },

    /// A transient system line. Not counted as a message.
    System {
        /// Notice text.
        text: String,
    },
}

/// Actions the client produces for the caller to execute, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Open the push-channel transport.
    Open,

    /// Subscribe to a scope on the push channel.
    Subscribe(SubscriptionScope),

    /// Send this event on the push channel.
    SendPrimary(WireEvent),

    /// Issue this request on the REST backup leg, fire-and-forget. The
    /// caller must not block the primary path on its completion.
    PostBackup(BackupRequest),

    /// Deliver a rendered event to the render sink.
    Render(RenderEvent),

    /// Show a transient user-visible notice.
    Notify {
        /// Notice text.
        text: String,
    },

    /// Resolve the current device location asynchronously, with the
    /// parameters from [`crate::Client::acquire_config`], and feed back
    /// [`ClientEvent::LocationAcquired`] or [`ClientEvent::LocationFailed`].
    AcquireLocation,

    /// Close the push-channel transport.
    Close,

    /// Log message for debugging.
    Log {
        /// Log message.
        message: String,
    },
}
