//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection               Outgoing dial
//!     → listener.rs (accept loop)           │
//!     → peer.rs (TcpPeer, inbound) ←────────┘ (TcpPeer, outbound)
//!     → connection.rs (id, state, live-count guard)
//!     → Hand off to the transport's connection task
//!
//! Connection States:
//!     Connecting → Handshaking → Notifying → Decoding → Closed
//!                       └──────────┴──→ Rejected → Closed
//! ```
//!
//! # Design Decisions
//! - The accept loop never awaits a connection task
//! - Accept errors are paced, never fatal
//! - The read half of a connection belongs to its task, the write half to the peer handle

pub mod connection;
pub mod listener;
pub mod peer;

pub use connection::{ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::Listener;
pub use peer::{Peer, TcpPeer};
