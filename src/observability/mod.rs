//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop and connection tasks produce:
//!     → tracing macros (structured log events)
//!     → metrics.rs (counters, gauges)
//!     → events.rs (typed TransportEvent broadcast)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, text or JSON)
//!     → Prometheus scrape endpoint (optional)
//!     → event subscribers (upper layer, tests)
//! ```
//!
//! # Design Decisions
//! - Every per-connection failure is reported here and nowhere else
//! - Events are fire-and-forget: no subscriber, no cost beyond a clone
//! - Metric updates are atomic increments, safe from any task

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventBus, TransportEvent};
