//! Client
//!
//! Action-based client state machine for the PairLink couple chat. Manages
//! the push-channel session, dual-transport delivery, receive-side
//! deduplication, and the periodic location sharer.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based patterns as
//! [`pairlink_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`])
//! for the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: Top-level state machine for one couple-chat session
//! - [`AutoSharer`]: Periodic location sharing with a minimum-interval floor
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::PushHandle`]: WebSocket push channel with frame channels
//! - [`transport::BackupSender`]: Fire-and-forget REST backup leg

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;
mod rest;
mod sharer;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, Direction, RenderEvent};
pub use pairlink_core::{SessionState, SubscriptionScope, env::Environment};
pub use rest::{BackupRequest, HttpMethod, ResponseKind};
pub use sharer::{AcquireConfig, AutoSharer, LocationProvider, MIN_SHARE_INTERVAL};
