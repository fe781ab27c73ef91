//! # vigil-feed
//!
//! Alert feed reconciliation for the Vigil console.
//!
//! This crate provides:
//! - [`Poller`] - the poll-cycle state machine (countdown, visibility
//!   gate, sequence-guarded apply, backoff on failure)
//! - [`AlertFeed`] - the reconciled fingerprint snapshot shared by the
//!   poll and push channels
//! - [`FeedClient`] - HTTP access to the alerting hub (fragment fetch,
//!   acknowledge, comment submission)
//! - [`LiveSocket`] - the best-effort WebSocket push channel
//! - [`NotificationPermission`] - arrival notification gating
//!
//! The poller is deliberately synchronous: the TUI loop ticks it once
//! a second and dispatches fetches itself, so all feed state lives on
//! one thread and responses can never race each other.

pub mod backoff;
pub mod client;
pub mod error;
pub mod feed;
pub mod fragment;
pub mod notify;
pub mod poller;
pub mod socket;

// Re-export main types for convenience
pub use backoff::BackoffPolicy;
pub use client::{CommentReceipt, FeedClient};
pub use error::{FeedError, Result};
pub use feed::{AlertFeed, ApplyOutcome};
pub use fragment::{AlertFragment, AlertRow};
pub use notify::NotificationPermission;
pub use poller::{FeedEvent, FetchTicket, Phase, Poller, PollerConfig, TickOutcome};
pub use socket::{ConnectionState, LiveSocket, SocketEvent};
