//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Accept loop:
//!     accept() fails
//!     → backoff.rs (delay grows with consecutive failures, plus jitter)
//!     → loop resumes accepting; next success resets the counter
//! ```
//!
//! # Design Decisions
//! - Nothing here retries a connection; pacing only
//! - Delays are capped so a recovered listener resumes quickly

pub mod backoff;

pub use backoff::AcceptBackoff;
