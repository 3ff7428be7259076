//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build transport → Start listener → Dial bootstrap peers
//!
//! Shutdown (shutdown.rs):
//!     Transport::close → trigger → accept loop exits → listener dropped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → node binary closes the transport
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind error aborts startup
//! - Bootstrap dial failures are logged and skipped, never retried
//! - Shutdown stops accepting only; live connections end on their own

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
