//! Shared utilities for transport integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use peer_transport::codec::{encode_frame, ByteStream, LengthPrefixedDecoder};
use peer_transport::{
    DecodeError, Decoder, Handshake, HandshakeError, OnPeer, Peer, PeerRejected, Rpc, RpcReceiver,
    TcpTransport, TcpTransportOpts, Transport, TransportEvent,
};

pub const WAIT: Duration = Duration::from_secs(3);

pub fn opts() -> TcpTransportOpts {
    TcpTransportOpts::new("127.0.0.1:0")
}

/// Build, start, and return a transport with its bound address.
pub async fn start_transport(opts: TcpTransportOpts) -> (TcpTransport, SocketAddr) {
    let transport = TcpTransport::new(opts);
    transport.listen_and_accept().await.unwrap();
    let addr = transport.local_addr().await.unwrap();
    (transport, addr)
}

pub async fn send_frames(stream: &mut TcpStream, payloads: &[&[u8]]) {
    for payload in payloads {
        stream.write_all(&encode_frame(payload).unwrap()).await.unwrap();
    }
}

pub async fn recv_within(rx: &RpcReceiver, timeout: Duration) -> Option<Rpc> {
    tokio::time::timeout(timeout, rx.recv()).await.ok().flatten()
}

/// Read until the remote closes or errors; panics if it stays open past `WAIT`.
pub async fn assert_closed_by_remote(stream: &mut TcpStream) {
    let mut buf = [0u8; 256];
    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "connection was not closed within {:?}", WAIT);
}

/// Wait for the first event matching `pred`.
pub async fn wait_for_event<F>(events: &mut broadcast::Receiver<TransportEvent>, mut pred: F) -> TransportEvent
where
    F: FnMut(&TransportEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Handshake that refuses everyone.
pub struct RejectAll;

#[async_trait]
impl Handshake for RejectAll {
    async fn handshake(&self, _peer: &dyn Peer, _reader: &mut ByteStream<'_>) -> Result<(), HandshakeError> {
        Err(HandshakeError::Rejected("not today".into()))
    }
}

/// Handshake that accepts every other connection, starting with the first.
#[derive(Default)]
pub struct Alternating {
    seen: AtomicUsize,
}

#[async_trait]
impl Handshake for Alternating {
    async fn handshake(&self, _peer: &dyn Peer, _reader: &mut ByteStream<'_>) -> Result<(), HandshakeError> {
        if self.seen.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            Ok(())
        } else {
            Err(HandshakeError::Rejected("odd connection".into()))
        }
    }
}

/// Handshake that writes a greeting before accepting.
pub struct Greeting(pub &'static [u8]);

#[async_trait]
impl Handshake for Greeting {
    async fn handshake(&self, peer: &dyn Peer, _reader: &mut ByteStream<'_>) -> Result<(), HandshakeError> {
        peer.send(self.0).await?;
        Ok(())
    }
}

/// Handshake that reads a fixed token from the remote and refuses on mismatch.
pub struct ExpectToken(pub &'static [u8]);

#[async_trait]
impl Handshake for ExpectToken {
    async fn handshake(&self, _peer: &dyn Peer, reader: &mut ByteStream<'_>) -> Result<(), HandshakeError> {
        let mut token = vec![0u8; self.0.len()];
        reader.read_exact(&mut token).await?;
        if token == self.0 {
            Ok(())
        } else {
            Err(HandshakeError::Rejected("bad token".into()))
        }
    }
}

/// Upper-layer callback that counts invocations and optionally refuses.
#[derive(Default)]
pub struct CountingOnPeer {
    pub calls: AtomicUsize,
    pub reject: bool,
}

impl CountingOnPeer {
    pub fn rejecting() -> Self {
        Self { calls: AtomicUsize::new(0), reject: true }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OnPeer for CountingOnPeer {
    async fn on_peer(&self, _peer: Arc<dyn Peer>) -> Result<(), PeerRejected> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            Err(PeerRejected::new("registry full"))
        } else {
            Ok(())
        }
    }
}

/// Length-prefixed decoder that counts how often it is invoked.
pub struct CountingDecoder {
    inner: LengthPrefixedDecoder,
    pub calls: AtomicUsize,
}

impl CountingDecoder {
    pub fn new() -> Self {
        Self { inner: LengthPrefixedDecoder::default(), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Decoder for CountingDecoder {
    async fn decode(&self, reader: &mut ByteStream<'_>, msg: &mut Rpc) -> Result<(), DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(reader, msg).await
    }
}

/// Upper-layer callback that keeps every peer handle it is given.
#[derive(Default)]
pub struct KeepPeers {
    pub peers: std::sync::Mutex<Vec<Arc<dyn Peer>>>,
}

impl KeepPeers {
    pub async fn wait_for_first(&self) -> Arc<dyn Peer> {
        tokio::time::timeout(WAIT, async {
            loop {
                let first = self.peers.lock().unwrap().first().cloned();
                if let Some(peer) = first {
                    return peer;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no peer registered")
    }
}

#[async_trait]
impl OnPeer for KeepPeers {
    async fn on_peer(&self, peer: Arc<dyn Peer>) -> Result<(), PeerRejected> {
        self.peers.lock().unwrap().push(peer);
        Ok(())
    }
}
