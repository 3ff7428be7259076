//! Connection identity, state machine, and live-connection tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Name the per-connection lifecycle states
//! - Count live connection tasks via drop guards

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough, the IDs only need to be unique.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle of one connection task.
///
/// ```text
/// Connecting → Handshaking → Notifying → Decoding → Closed
///                  │             │
///                  └──→ Rejected ←┘ → Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket accepted or dialed, peer handle being built.
    Connecting,
    /// Injected handshake running.
    Handshaking,
    /// Upper-layer callback deciding whether to keep the peer.
    Notifying,
    /// Handshake or callback refused the peer.
    Rejected,
    /// Decode loop feeding the inbound channel.
    Decoding,
    /// Connection released.
    Closed,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Handshaking)
                | (Connecting, Closed)
                | (Handshaking, Notifying)
                | (Handshaking, Decoding)
                | (Handshaking, Rejected)
                | (Notifying, Decoding)
                | (Notifying, Rejected)
                | (Rejected, Closed)
                | (Decoding, Closed)
        )
    }
}

/// Counts live connection tasks.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live connection. Returns a guard that decrements on drop.
    pub fn track(&self, id: ConnectionId) -> ConnectionGuard {
        let now = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(now);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id,
        }
    }

    /// Get current live connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a connection task's lifetime.
/// Decrements the live count when dropped, including on panic.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let now = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_connections(now);
        tracing::trace!(connection_id = %self.id, "Connection task finished");
    }
}
