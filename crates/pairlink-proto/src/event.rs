//! Wire events and the outbound event wrapper.

use serde::{Deserialize, Serialize};

use crate::ids::{EventId, RoomId, UserId};

/// Device position as reported by the geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPosition {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Reported accuracy in meters.
    pub accuracy: f64,
}

/// Everything that crosses the wire, in either direction.
///
/// Discriminated by the string `kind` tag. `sender_id` is absent on outbound
/// events (the server stamps it before fanning the event back out) and
/// present on inbound ones.
///
/// `System`, `Error`, and `Pong` carry no event identifier: they are
/// transient, never retransmitted, and therefore carry no duplication risk.
/// Matches on this union at the render boundary must stay exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WireEvent {
    /// A chat message.
    #[serde(rename_all = "camelCase")]
    Chat {
        /// Sender-generated event identifier.
        id: EventId,
        /// Room the message belongs to.
        room_id: RoomId,
        /// Sender, stamped by the server on inbound events.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<UserId>,
        /// Message text.
        content: String,
        /// Unix milliseconds at creation.
        timestamp: u64,
    },

    /// A shared location.
    #[serde(rename_all = "camelCase")]
    Location {
        /// Sender-generated event identifier.
        id: EventId,
        /// Room the share belongs to.
        room_id: RoomId,
        /// Sender, stamped by the server on inbound events.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<UserId>,
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
        /// Reported accuracy in meters.
        accuracy: f64,
        /// Human-readable address, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        /// Unix milliseconds at creation.
        timestamp: u64,
    },

    /// Transient server notice. Never retransmitted, always rendered.
    #[serde(rename_all = "camelCase")]
    System {
        /// Notice text.
        text: String,
    },

    /// Session acknowledgment after the push channel handshake.
    #[serde(rename_all = "camelCase")]
    Connected {
        /// Server-assigned session token.
        session: String,
    },

    /// Server-side error surfaced over the push channel.
    #[serde(rename_all = "camelCase")]
    Error {
        /// Error description.
        reason: String,
    },

    /// Heartbeat reply. Carries nothing.
    Pong,
}

impl WireEvent {
    /// Identifier for deduplication. `None` for transient events, which
    /// bypass the ledger and are always rendered.
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            Self::Chat { id, .. } | Self::Location { id, .. } => Some(*id),
            Self::System { .. } | Self::Connected { .. } | Self::Error { .. } | Self::Pong => None,
        }
    }

    /// Sender identifier, when the server stamped one.
    pub fn sender_id(&self) -> Option<UserId> {
        match self {
            Self::Chat { sender_id, .. } | Self::Location { sender_id, .. } => *sender_id,
            Self::System { .. } | Self::Connected { .. } | Self::Error { .. } | Self::Pong => None,
        }
    }

    /// Encode as the JSON text frame both transports carry.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode a JSON array of events, as the backlog and location history
    /// routes return them.
    pub fn list_from_json(text: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Content of an [`OutboundEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    /// Chat message text.
    Chat {
        /// Message text.
        content: String,
    },
    /// A location to share.
    Location {
        /// Device position.
        position: GeoPosition,
        /// Human-readable address, when known.
        address: Option<String>,
    },
}

/// A locally created event awaiting delivery.
///
/// Immutable once created. The identifier travels unchanged across both the
/// push channel and the REST backup leg so the server and the peer can
/// correlate duplicate deliveries.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    /// Locally generated identifier.
    pub id: EventId,
    /// Target room.
    pub room_id: RoomId,
    /// Event content.
    pub payload: OutboundPayload,
    /// Unix milliseconds at creation.
    pub timestamp: u64,
}

impl OutboundEvent {
    /// Wire representation shared by both delivery legs.
    pub fn to_wire(&self) -> WireEvent {
        match &self.payload {
            OutboundPayload::Chat { content } => WireEvent::Chat {
                id: self.id,
                room_id: self.room_id,
                sender_id: None,
                content: content.clone(),
                timestamp: self.timestamp,
            },
            OutboundPayload::Location { position, address } => WireEvent::Location {
                id: self.id,
                room_id: self.room_id,
                sender_id: None,
                latitude: position.latitude,
                longitude: position.longitude,
                accuracy: position.accuracy,
                address: address.clone(),
                timestamp: self.timestamp,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn room() -> RoomId {
        RoomId::from_random_bytes([2; 16])
    }

    #[test]
    fn chat_uses_string_tag_and_camel_case_fields() {
        let event = WireEvent::Chat {
            id: EventId::from_random_bytes([1; 16]),
            room_id: room(),
            sender_id: None,
            content: "hello".to_string(),
            timestamp: 1_700_000_000_000,
        };

        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["kind"], "chat");
        assert_eq!(json["content"], "hello");
        assert!(json.get("roomId").is_some());
        // Outbound events omit the sender; the server stamps it
        assert!(json.get("senderId").is_none());
    }

    #[test]
    fn inbound_chat_decodes_server_stamped_sender() {
        let sender = UserId::from_random_bytes([9; 16]);
        let text = format!(
            r#"{{"kind":"chat","id":"{}","roomId":"{}","senderId":"{}","content":"hi","timestamp":12}}"#,
            EventId::from_random_bytes([1; 16]),
            room(),
            sender,
        );

        let event = WireEvent::from_json(&text).unwrap();
        assert_eq!(event.sender_id(), Some(sender));
        assert!(event.event_id().is_some());
    }

    #[test]
    fn location_wire_shape() {
        let event = WireEvent::Location {
            id: EventId::from_random_bytes([3; 16]),
            room_id: room(),
            sender_id: None,
            latitude: 37.5665,
            longitude: 126.9780,
            accuracy: 12.0,
            address: Some("Seoul".to_string()),
            timestamp: 42,
        };

        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["kind"], "location");
        assert_eq!(json["latitude"], 37.5665);
        assert_eq!(json["address"], "Seoul");
    }

    #[test]
    fn backlog_pages_decode_as_event_lists() {
        let text = format!(
            r#"[{{"kind":"chat","id":"{}","roomId":"{}","content":"hi","timestamp":1}},
                {{"kind":"system","text":"partner joined"}}]"#,
            EventId::from_random_bytes([1; 16]),
            room(),
        );

        let events = WireEvent::list_from_json(&text).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], WireEvent::Chat { .. }));
        assert!(WireEvent::list_from_json("[]").unwrap().is_empty());
        assert!(WireEvent::list_from_json("{}").is_err());
    }

    #[test]
    fn transient_events_have_no_id() {
        assert_eq!(WireEvent::System { text: "notice".to_string() }.event_id(), None);
        assert_eq!(WireEvent::Pong.event_id(), None);
        assert_eq!(WireEvent::Error { reason: "boom".to_string() }.event_id(), None);
    }

    #[test]
    fn pong_round_trips() {
        let decoded = WireEvent::from_json(r#"{"kind":"pong"}"#).unwrap();
        assert_eq!(decoded, WireEvent::Pong);
    }

    #[test]
    fn outbound_event_keeps_id_across_wire_conversion() {
        let event = OutboundEvent {
            id: EventId::from_random_bytes([5; 16]),
            room_id: room(),
            payload: OutboundPayload::Chat { content: "ping".to_string() },
            timestamp: 77,
        };

        assert_eq!(event.to_wire().event_id(), Some(event.id));
        assert_eq!(event.to_wire().sender_id(), None);
    }
}
