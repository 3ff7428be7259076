//! Error types for the transport and its collaborators.
//!
//! Only [`TransportError`] ever reaches the caller of a public transport
//! operation. The per-connection errors are contained inside the connection
//! task that produced them and are reported through logs and events.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors returned from transport lifecycle operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Failed to connect to a remote address.
    #[error("failed to dial {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// `listen_and_accept` was called while a listener is already running.
    #[error("transport is already listening on {0}")]
    AlreadyListening(SocketAddr),

    /// `close` was called without an active listener.
    #[error("transport is not listening")]
    NotListening,

    /// Other I/O failure on the listening socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors produced by a [`Decoder`](crate::codec::Decoder).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The remote side closed the stream on a message boundary.
    #[error("connection closed by peer")]
    Closed,

    /// Frame header announced more bytes than the decoder accepts.
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The decode loop was stopped because the peer was closed locally.
    #[error("peer closed locally")]
    Cancelled,

    /// Read failure, including EOF in the middle of a frame.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors produced by a [`Handshake`](crate::handshake::Handshake).
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The handshake logic refused the peer.
    #[error("handshake rejected: {0}")]
    Rejected(String),

    /// I/O failure while exchanging handshake data.
    #[error("handshake I/O error: {0}")]
    Io(#[from] io::Error),

    /// Peer-level failure (e.g. writing to an already closed peer).
    #[error(transparent)]
    Peer(#[from] PeerError),
}

/// Returned by an [`OnPeer`](crate::handshake::OnPeer) callback that refuses a peer.
#[derive(Debug, Clone, Error)]
#[error("peer rejected: {reason}")]
pub struct PeerRejected {
    pub reason: String,
}

impl PeerRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Errors from operations on a single peer.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The peer has already been closed.
    #[error("peer {0} is closed")]
    Closed(SocketAddr),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
