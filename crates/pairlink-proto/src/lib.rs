//! Wire protocol
//!
//! JSON event model shared by both delivery transports of the PairLink
//! client: the persistent push channel and the REST backup leg. Events are
//! discriminated by a string `kind` tag with camelCase fields, matching what
//! the server broadcasts on the couple topics.
//!
//! # Components
//!
//! - [`WireEvent`]: Tagged union of everything that crosses the wire
//! - [`OutboundEvent`]: Locally created, immutable event awaiting delivery
//! - [`EventId`], [`RoomId`], [`UserId`]: Stable identifiers
//! - [`GeoPosition`]: Device position as the geolocation provider reports it

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod event;
mod ids;

pub use event::{GeoPosition, OutboundEvent, OutboundPayload, WireEvent};
pub use ids::{EventId, RoomId, UserId};
