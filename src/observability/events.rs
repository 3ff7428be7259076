//! Typed reporting events.
//!
//! Every event the transport logs is also published here so that the upper
//! layer and tests can observe the lifecycle without scraping logs.

use std::net::SocketAddr;
use tokio::sync::broadcast;

/// Capacity of the event ring; slow subscribers see `Lagged` instead of
/// stalling the transport.
const EVENT_CAPACITY: usize = 256;

/// A discrete lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Listener bound and the accept loop started.
    Listening { addr: SocketAddr },
    /// Accept loop observed the listener closing and exited.
    ListenerClosed,
    /// An accept call failed; the loop keeps going.
    AcceptFailed { error: String },
    /// A connection was accepted or dialed and a task started for it.
    ConnectionAccepted { peer_addr: SocketAddr, outbound: bool },
    HandshakeFailed { peer_addr: SocketAddr, error: String },
    /// The upper-layer callback refused the peer.
    PeerRejected { peer_addr: SocketAddr, error: String },
    /// Handshake and callback passed; the decode loop is starting.
    PeerReady { peer_addr: SocketAddr },
    DecodeFailed { peer_addr: SocketAddr, error: String },
    /// The connection was released. Emitted exactly once per connection.
    ConnectionClosed { peer_addr: SocketAddr },
}

/// Broadcast fan-out for [`TransportEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TransportEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
