//! Peer-to-peer stream transport.
//!
//! Accepts and dials TCP connections, runs an injected handshake on each,
//! optionally lets the upper layer register the peer, and then decodes the
//! connection's byte stream into [`Rpc`] messages delivered on one shared
//! channel.
//!
//! ```no_run
//! use peer_transport::{TcpTransport, TcpTransportOpts, Transport};
//!
//! # async fn run() -> Result<(), peer_transport::TransportError> {
//! let transport = TcpTransport::new(TcpTransportOpts::new("127.0.0.1:3000"));
//! transport.listen_and_accept().await?;
//!
//! let inbound = transport.consume();
//! while let Some(rpc) = inbound.recv().await {
//!     println!("{} sent {} bytes", rpc.from, rpc.payload.len());
//! }
//! # Ok(())
//! # }
//! ```

// Core
pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;
pub mod net;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use codec::Decoder;
pub use config::NodeConfig;
pub use error::{DecodeError, HandshakeError, PeerError, PeerRejected, TransportError};
pub use handshake::{Handshake, NopHandshake, OnPeer};
pub use message::Rpc;
pub use net::{Peer, TcpPeer};
pub use observability::TransportEvent;
pub use transport::{RpcReceiver, TcpTransport, TcpTransportOpts, Transport};
