//! Stable identifiers for events, rooms, and users.
//!
//! All three are UUIDs on the wire. [`EventId`] is generated locally by the
//! sender and travels unchanged across both transports so the receiver can
//! correlate duplicate deliveries of the same logical event.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Build from 16 bytes of entropy, formatted as a v4 UUID.
            ///
            /// The caller supplies the entropy (normally from the
            /// environment) so identifier generation stays deterministic
            /// under a seeded test environment.
            pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
                Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
            }
        }
    };
}

uuid_id! {
    /// Locally generated identifier of a single logical event.
    EventId
}

uuid_id! {
    /// Identifier of the one couple chat room this client lives in.
    RoomId
}

uuid_id! {
    /// Identifier of a chat participant.
    UserId
}
