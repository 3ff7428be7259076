//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! listen_and_accept ─→ accept loop ─┐
//!                                   ├─→ one task per connection:
//! dial ─────────────────────────────┘      handshake
//!                                          → on_peer (optional)
//!                                          → decode loop
//!                                          → inbound channel ─→ consume()
//! ```
//!
//! # Design Decisions
//! - One task per connection, no cap on connection count
//! - The inbound channel holds a single message, so an idle consumer stalls every decode loop
//! - Per-connection failures stay in the connection task; only lifecycle errors reach callers

pub mod inbound;
pub mod tcp;

use async_trait::async_trait;

use crate::error::TransportError;

pub use inbound::RpcReceiver;
pub use tcp::{TcpTransport, TcpTransportOpts};

/// Lifecycle surface of a node-to-node transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Configured listen address.
    fn addr(&self) -> &str;

    /// Bind the listen address and start accepting in the background.
    async fn listen_and_accept(&self) -> Result<(), TransportError>;

    /// Connect to `addr` and run the connection like an accepted one.
    async fn dial(&self, addr: &str) -> Result<(), TransportError>;

    /// Receive-only view of the inbound message channel.
    fn consume(&self) -> RpcReceiver;

    /// Stop accepting. Established connections keep running.
    async fn close(&self) -> Result<(), TransportError>;
}
