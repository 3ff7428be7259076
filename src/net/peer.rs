//! Peer handles.
//!
//! A [`Peer`] is a capability over one connection: who is on the other end,
//! which side opened it, and the right to write to it or close it. The read
//! side of the connection is not part of the handle; it stays with the
//! connection task that runs the decode loop.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};

use crate::error::PeerError;
use crate::net::connection::ConnectionId;

/// A remote node reachable over one connection.
#[async_trait]
pub trait Peer: Send + Sync + fmt::Debug {
    /// Address of the remote end of the connection.
    fn remote_addr(&self) -> SocketAddr;

    /// `true` if this node dialed the connection, `false` if it was accepted.
    fn is_outbound(&self) -> bool;

    /// Write raw bytes to the connection.
    async fn send(&self, bytes: &[u8]) -> Result<(), PeerError>;

    /// Release the connection. Calls after the first are no-ops.
    async fn close(&self) -> Result<(), PeerError>;
}

/// A peer backed by a TCP stream.
#[derive(Debug)]
pub struct TcpPeer {
    id: ConnectionId,
    remote_addr: SocketAddr,
    outbound: bool,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: watch::Sender<bool>,
}

impl TcpPeer {
    /// Take ownership of `stream` and split it into the peer handle and the
    /// read half the decode loop consumes.
    pub fn new(stream: TcpStream, outbound: bool) -> std::io::Result<(Self, OwnedReadHalf)> {
        let remote_addr = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        let (closed, _) = watch::channel(false);

        let peer = Self {
            id: ConnectionId::new(),
            remote_addr,
            outbound,
            writer: Mutex::new(Some(writer)),
            closed,
        };
        Ok((peer, reader))
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolves once `close` has been called, immediately if it already was.
    pub async fn closed(&self) {
        let mut signal = self.closed.subscribe();
        loop {
            if *signal.borrow_and_update() {
                return;
            }
            if signal.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl Peer for TcpPeer {
    fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    fn is_outbound(&self) -> bool {
        self.outbound
    }

    async fn send(&self, bytes: &[u8]) -> Result<(), PeerError> {
        let mut writer = self.writer.lock().await;
        let Some(w) = writer.as_mut() else {
            return Err(PeerError::Closed(self.remote_addr));
        };

        // A remote that stopped reading must not pin the writer lock past `close`.
        tokio::select! {
            biased;
            _ = self.closed() => Err(PeerError::Closed(self.remote_addr)),
            res = w.write_all(bytes) => res.map_err(PeerError::from),
        }
    }

    async fn close(&self) -> Result<(), PeerError> {
        // Wakes the decode loop and any send parked on a full socket buffer.
        self.closed.send_replace(true);

        let writer = self.writer.lock().await.take();
        if let Some(mut w) = writer {
            match w.shutdown().await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl fmt::Display for TcpPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.outbound { "outbound" } else { "inbound" };
        write!(f, "{} {} ({})", self.id, self.remote_addr, direction)
    }
}
