//! # vigil-tui
//!
//! Terminal user interface for the Vigil alert console.
//!
//! The TUI owns the poll-cycle state machine from `vigil-feed` and
//! drives it from a synchronous event loop: one tick per second, HTTP
//! and WebSocket work dispatched onto a tokio runtime, results drained
//! back over channels between frames.
//!
//! Modules:
//! - [`app`] - application state and the main loop
//! - [`event`] - keyboard handling, normal and modal modes
//! - [`alert_panel`] - the alert list and the acknowledge modal
//! - [`status_bar`] - countdown, last update, socket state, failure banner

pub mod alert_panel;
pub mod app;
pub mod event;
pub mod status_bar;

pub use app::{App, AppResult};
pub use event::{AppEvent, InputHandler};
