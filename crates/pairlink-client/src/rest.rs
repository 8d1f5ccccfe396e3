//! REST backup leg request model.
//!
//! The backup leg is a set of thin request wrappers with no logic of its
//! own: failures are logged and surfaced as a notice, never retried. The
//! client emits fully resolved [`BackupRequest`]s; a driver executes them
//! with the caller identity header attached.

use pairlink_proto::{EventId, OutboundEvent, RoomId, WireEvent};

/// Header carrying the caller identity on every backup request.
#[cfg_attr(not(feature = "transport"), allow(dead_code))]
pub const USER_ID_HEADER: &str = "X-User-ID";

/// HTTP method of a backup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
}

/// What the route's response body carries, so the driver knows how to
/// feed it back into the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Nothing worth decoding.
    Empty,
    /// A JSON array of wire events, fed back one by one as
    /// `EventReceived`; the ledger drops the already-rendered ones.
    Events,
    /// A bare JSON integer, fed back as `UnreadCount`.
    Count,
}

/// One fully resolved request on the REST backup leg.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path and query relative to the server base URL.
    pub path: String,
    /// JSON body, when the route carries one.
    pub body: Option<WireEvent>,
    /// Event this request duplicates, for correlating the settlement.
    pub event_id: Option<EventId>,
    /// Shape of the response body.
    pub response: ResponseKind,
}

impl BackupRequest {
    /// Backup copy of an outbound chat message.
    pub fn post_message(event: &OutboundEvent) -> Self {
        Self {
            method: HttpMethod::Post,
            path: "/api/v1/couple-chat/messages".to_string(),
            body: Some(event.to_wire()),
            event_id: Some(event.id),
            response: ResponseKind::Empty,
        }
    }

    /// Backup copy of an outbound location share.
    pub fn post_location(event: &OutboundEvent) -> Self {
        Self {
            method: HttpMethod::Post,
            path: "/api/v1/location/share".to_string(),
            body: Some(event.to_wire()),
            event_id: Some(event.id),
            response: ResponseKind::Empty,
        }
    }

    /// Fetch a page of the room's message backlog.
    pub fn get_messages(room_id: RoomId, page: u32, size: u32) -> Self {
        Self {
            method: HttpMethod::Get,
            path: format!("/api/v1/couple-chat/rooms/{room_id}/messages?page={page}&size={size}"),
            body: None,
            event_id: None,
            response: ResponseKind::Events,
        }
    }

    /// Mark the room's messages as read by the local user.
    pub fn mark_read(room_id: RoomId) -> Self {
        Self {
            method: HttpMethod::Put,
            path: format!("/api/v1/couple-chat/rooms/{room_id}/read"),
            body: None,
            event_id: None,
            response: ResponseKind::Empty,
        }
    }

    /// Fetch the local user's unread message count.
    pub fn get_unread_count(room_id: RoomId) -> Self {
        Self {
            method: HttpMethod::Get,
            path: format!("/api/v1/couple-chat/rooms/{room_id}/unread-count"),
            body: None,
            event_id: None,
            response: ResponseKind::Count,
        }
    }

    /// Fetch the couple's latest known locations.
    pub fn get_latest_locations(room_id: RoomId) -> Self {
        Self {
            method: HttpMethod::Get,
            path: format!("/api/v1/location/couple/{room_id}/latest"),
            body: None,
            event_id: None,
            response: ResponseKind::Events,
        }
    }

    /// Fetch a page of the couple's location history.
    pub fn get_location_history(room_id: RoomId, page: u32, size: u32) -> Self {
        Self {
            method: HttpMethod::Get,
            path: format!("/api/v1/location/couple/{room_id}/history?page={page}&size={size}"),
            body: None,
            event_id: None,
            response: ResponseKind::Events,
        }
    }
}
