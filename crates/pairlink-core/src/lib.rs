//! Core
//!
//! Sans-IO foundations of the PairLink client. Pure state machines with no
//! I/O: methods take time as input and return actions for a driver to
//! execute, which keeps the logic deterministic and directly testable.
//!
//! # Components
//!
//! - [`Connection`]: Push-channel session lifecycle state machine
//! - [`DedupLedger`]: Seen-identifier set gating exactly-once rendering
//! - [`env::Environment`]: Time and randomness abstraction

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod dedup;
pub mod env;
mod error;

pub use connection::{Connection, ConnectionAction, ConnectionConfig, SessionState, SubscriptionScope};
pub use dedup::DedupLedger;
pub use error::ConnectionError;
