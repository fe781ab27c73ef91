//! # vigil-core
//!
//! Core errors, configuration, and logging for the Vigil alert console.
//!
//! This crate provides:
//! - [`VigilError`] - Error types for startup and infrastructure
//! - [`config`] - YAML configuration with defaults and validation
//! - [`logging`] - Tracing setup and log management
//!
//! ## Example
//!
//! ```no_run
//! use vigil_core::{VigilConfig, logging};
//!
//! fn main() -> vigil_core::Result<()> {
//!     let _guard = logging::init_logging(None, false)?;
//!     let config = VigilConfig::load(None)?;
//!     tracing::info!(base_url = %config.server.base_url, "configured");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

// Re-export main types for convenience
pub use config::{NotificationConfig, PollConfig, ServerConfig, SocketConfig, VigilConfig};
pub use error::{Result, VigilError};
pub use logging::{LogGuard, init_logging};
