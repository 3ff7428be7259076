//! Extension points run before a peer's data is trusted.
//!
//! [`Handshake`] validates a fresh connection; [`OnPeer`] lets the upper layer
//! register or refuse a peer that passed the handshake. Both are injected
//! into the transport as trait objects, and plain functions implement them.
//! A plain-function handshake only sees the peer handle; implement the trait
//! directly to read from the connection:
//!
//! ```
//! use std::sync::Arc;
//! use peer_transport::{HandshakeError, Handshake, Peer};
//!
//! fn loopback_only(peer: &dyn Peer) -> Result<(), HandshakeError> {
//!     if peer.remote_addr().ip().is_loopback() {
//!         Ok(())
//!     } else {
//!         Err(HandshakeError::Rejected("not loopback".into()))
//!     }
//! }
//!
//! let handshake: Arc<dyn Handshake> = Arc::new(loopback_only);
//! # let _ = handshake;
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::codec::ByteStream;
use crate::error::{HandshakeError, PeerRejected};
use crate::net::Peer;

/// Validates a connection before the decode loop starts.
///
/// Called exactly once per connection. An error closes the connection and the
/// upper layer never hears about the peer.
///
/// `reader` is the connection's read half. Whatever the handshake leaves
/// unread is the first input of the decoder.
#[async_trait]
pub trait Handshake: Send + Sync {
    async fn handshake(&self, peer: &dyn Peer, reader: &mut ByteStream<'_>) -> Result<(), HandshakeError>;
}

#[async_trait]
impl<F> Handshake for F
where
    F: Fn(&dyn Peer) -> Result<(), HandshakeError> + Send + Sync,
{
    async fn handshake(&self, peer: &dyn Peer, _reader: &mut ByteStream<'_>) -> Result<(), HandshakeError> {
        self(peer)
    }
}

/// Accepts every peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopHandshake;

#[async_trait]
impl Handshake for NopHandshake {
    async fn handshake(&self, _peer: &dyn Peer, _reader: &mut ByteStream<'_>) -> Result<(), HandshakeError> {
        Ok(())
    }
}

/// Upper-layer notification for peers that passed the handshake.
///
/// The callback receives a shared handle it may keep for sending. Returning
/// an error closes the connection before any message is decoded.
#[async_trait]
pub trait OnPeer: Send + Sync {
    async fn on_peer(&self, peer: Arc<dyn Peer>) -> Result<(), PeerRejected>;
}

#[async_trait]
impl<F> OnPeer for F
where
    F: Fn(Arc<dyn Peer>) -> Result<(), PeerRejected> + Send + Sync,
{
    async fn on_peer(&self, peer: Arc<dyn Peer>) -> Result<(), PeerRejected> {
        self(peer)
    }
}
