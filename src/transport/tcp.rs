//! TCP transport: listener lifecycle, dialing, and per-connection tasks.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::codec::{Decoder, LengthPrefixedDecoder};
use crate::config::TransportConfig;
use crate::error::{DecodeError, TransportError};
use crate::handshake::{Handshake, NopHandshake, OnPeer};
use crate::lifecycle::Shutdown;
use crate::message::Rpc;
use crate::net::{ConnectionState, ConnectionTracker, Listener, Peer, TcpPeer};
use crate::observability::{metrics, EventBus, TransportEvent};
use crate::resilience::AcceptBackoff;
use crate::transport::inbound::{self, RpcReceiver};
use crate::transport::Transport;

/// Construction options for [`TcpTransport`].
#[derive(Clone)]
pub struct TcpTransportOpts {
    pub listen_addr: String,
    pub handshake: Arc<dyn Handshake>,
    pub decoder: Arc<dyn Decoder>,
    pub on_peer: Option<Arc<dyn OnPeer>>,
    pub accept_backoff_base_ms: u64,
    pub accept_backoff_max_ms: u64,
}

impl TcpTransportOpts {
    /// Options with a no-op handshake, the length-prefixed decoder and no callback.
    pub fn new(listen_addr: impl Into<String>) -> Self {
        let defaults = TransportConfig::default();
        Self {
            listen_addr: listen_addr.into(),
            handshake: Arc::new(NopHandshake),
            decoder: Arc::new(LengthPrefixedDecoder::default()),
            on_peer: None,
            accept_backoff_base_ms: defaults.accept_backoff_base_ms,
            accept_backoff_max_ms: defaults.accept_backoff_max_ms,
        }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            accept_backoff_base_ms: config.accept_backoff_base_ms,
            accept_backoff_max_ms: config.accept_backoff_max_ms,
            ..Self::new(config.listen_address.clone())
        }
    }

    pub fn with_handshake(mut self, handshake: Arc<dyn Handshake>) -> Self {
        self.handshake = handshake;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_on_peer(mut self, on_peer: Arc<dyn OnPeer>) -> Self {
        self.on_peer = Some(on_peer);
        self
    }
}

impl std::fmt::Debug for TcpTransportOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransportOpts")
            .field("listen_addr", &self.listen_addr)
            .field("on_peer", &self.on_peer.is_some())
            .field("accept_backoff_base_ms", &self.accept_backoff_base_ms)
            .field("accept_backoff_max_ms", &self.accept_backoff_max_ms)
            .finish_non_exhaustive()
    }
}

/// State shared by the accept loop and every connection task.
struct ConnectionContext {
    handshake: Arc<dyn Handshake>,
    decoder: Arc<dyn Decoder>,
    on_peer: Option<Arc<dyn OnPeer>>,
    rpc_tx: mpsc::Sender<Rpc>,
    events: EventBus,
    tracker: ConnectionTracker,
}

/// A running accept loop.
struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

/// Stream-socket transport.
///
/// Owns the listening socket and the inbound channel. Every accepted or
/// dialed connection gets its own task that runs the handshake, the optional
/// upper-layer callback, and then the decode loop.
pub struct TcpTransport {
    listen_addr: String,
    accept_backoff_base_ms: u64,
    accept_backoff_max_ms: u64,
    ctx: Arc<ConnectionContext>,
    rpc_rx: RpcReceiver,
    listener: Mutex<Option<ListenerHandle>>,
}

impl TcpTransport {
    pub fn new(opts: TcpTransportOpts) -> Self {
        let (rpc_tx, rpc_rx) = inbound::channel();

        let ctx = ConnectionContext {
            handshake: opts.handshake,
            decoder: opts.decoder,
            on_peer: opts.on_peer,
            rpc_tx,
            events: EventBus::new(),
            tracker: ConnectionTracker::new(),
        };

        Self {
            listen_addr: opts.listen_addr,
            accept_backoff_base_ms: opts.accept_backoff_base_ms,
            accept_backoff_max_ms: opts.accept_backoff_max_ms,
            ctx: Arc::new(ctx),
            rpc_rx,
            listener: Mutex::new(None),
        }
    }

    /// Address the listener is actually bound to, while listening.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().await.as_ref().map(|h| h.local_addr)
    }

    /// Number of connection tasks currently alive.
    pub fn active_connections(&self) -> u64 {
        self.ctx.tracker.active_count()
    }

    /// Subscribe to lifecycle events emitted from now on.
    pub fn events(&self) -> broadcast::Receiver<TransportEvent> {
        self.ctx.events.subscribe()
    }

    fn spawn_connection(&self, stream: TcpStream, outbound: bool) {
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move { ctx.handle_conn(stream, outbound).await });
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn addr(&self) -> &str {
        &self.listen_addr
    }

    async fn listen_and_accept(&self) -> Result<(), TransportError> {
        let mut slot = self.listener.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Err(TransportError::AlreadyListening(handle.local_addr));
        }

        let listener = Listener::bind(&self.listen_addr).await?;
        let local_addr = listener.local_addr();

        let shutdown = Shutdown::new();
        let stop = shutdown.subscribe();
        let backoff = AcceptBackoff::new(self.accept_backoff_base_ms, self.accept_backoff_max_ms);
        let ctx = Arc::clone(&self.ctx);
        let events = self.ctx.events.clone();

        let task = tokio::spawn(listener.run(stop, backoff, events, move |stream, _peer_addr| {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { ctx.handle_conn(stream, false).await });
        }));

        tracing::info!(address = %local_addr, "Transport listening");
        self.ctx.events.emit(TransportEvent::Listening { addr: local_addr });

        *slot = Some(ListenerHandle { local_addr, shutdown, task });
        Ok(())
    }

    async fn dial(&self, addr: &str) -> Result<(), TransportError> {
        let stream = TcpStream::connect(addr).await.map_err(|source| TransportError::Dial {
            addr: addr.to_string(),
            source,
        })?;

        tracing::debug!(remote = %addr, "Dialed peer");
        self.spawn_connection(stream, true);
        Ok(())
    }

    fn consume(&self) -> RpcReceiver {
        self.rpc_rx.clone()
    }

    async fn close(&self) -> Result<(), TransportError> {
        let handle = self.listener.lock().await.take().ok_or(TransportError::NotListening)?;

        handle.shutdown.trigger();
        if let Err(e) = handle.task.await {
            tracing::error!(error = %e, "Accept loop terminated abnormally");
        }
        Ok(())
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("listen_addr", &self.listen_addr)
            .field("active_connections", &self.active_connections())
            .finish_non_exhaustive()
    }
}

impl ConnectionContext {
    /// Drive one connection from handshake to close.
    async fn handle_conn(&self, stream: TcpStream, outbound: bool) {
        let (peer, mut reader) = match TcpPeer::new(stream, outbound) {
            Ok(split) => split,
            Err(e) => {
                tracing::warn!(error = %e, outbound, "Dropping connection without a peer address");
                return;
            }
        };
        let peer = Arc::new(peer);
        let peer_addr = peer.remote_addr();
        let guard = self.tracker.track(peer.id());

        metrics::record_connection(outbound);
        tracing::debug!(connection_id = %peer.id(), peer_addr = %peer_addr, outbound, "New connection");
        self.events.emit(TransportEvent::ConnectionAccepted { peer_addr, outbound });

        let mut state = self.run_connection(&peer, &mut reader).await;

        // Every exit path lands here: the read half goes first, then the peer
        drop(reader);
        if let Err(e) = peer.close().await {
            tracing::debug!(connection_id = %peer.id(), error = %e, "Error while closing connection");
        }

        tracing::debug!(
            connection_id = %peer.id(),
            peer_addr = %peer_addr,
            state = ?state,
            "Closing connection"
        );
        advance(&mut state, ConnectionState::Closed, &peer);

        // Subscribers seeing the close must also see the connection uncounted.
        drop(guard);
        self.events.emit(TransportEvent::ConnectionClosed { peer_addr });
    }

    /// Run handshake, callback and decode loop; returns the state the
    /// connection was in when it stopped.
    async fn run_connection(&self, peer: &Arc<TcpPeer>, reader: &mut OwnedReadHalf) -> ConnectionState {
        let peer_addr = peer.remote_addr();
        let mut state = ConnectionState::Connecting;

        advance(&mut state, ConnectionState::Handshaking, peer);
        if let Err(e) = self.handshake.handshake(&**peer, reader).await {
            tracing::warn!(connection_id = %peer.id(), peer_addr = %peer_addr, error = %e, "Handshake failed");
            metrics::record_handshake_failure();
            self.events.emit(TransportEvent::HandshakeFailed { peer_addr, error: e.to_string() });
            advance(&mut state, ConnectionState::Rejected, peer);
            return state;
        }

        if let Some(on_peer) = &self.on_peer {
            advance(&mut state, ConnectionState::Notifying, peer);
            let handle: Arc<dyn Peer> = Arc::clone(peer) as Arc<dyn Peer>;
            if let Err(e) = on_peer.on_peer(handle).await {
                tracing::warn!(connection_id = %peer.id(), peer_addr = %peer_addr, error = %e, "Peer rejected");
                metrics::record_peer_rejected();
                self.events.emit(TransportEvent::PeerRejected { peer_addr, error: e.to_string() });
                advance(&mut state, ConnectionState::Rejected, peer);
                return state;
            }
        }

        tracing::debug!(connection_id = %peer.id(), peer_addr = %peer_addr, "Handshake completed");
        self.events.emit(TransportEvent::PeerReady { peer_addr });
        advance(&mut state, ConnectionState::Decoding, peer);

        loop {
            let mut msg = Rpc::default();
            let decoded = tokio::select! {
                biased;
                _ = peer.closed() => Err(DecodeError::Cancelled),
                res = self.decoder.decode(reader, &mut msg) => res,
            };

            match decoded {
                Ok(()) => {
                    msg.from = peer_addr;
                    // A full channel parks the loop here, so a local close must win this race too.
                    let delivered = tokio::select! {
                        biased;
                        _ = peer.closed() => {
                            tracing::debug!(connection_id = %peer.id(), peer_addr = %peer_addr, "Peer closed locally, dropping undelivered message");
                            return state;
                        }
                        res = self.rpc_tx.send(msg) => res,
                    };
                    if delivered.is_err() {
                        tracing::debug!(connection_id = %peer.id(), "Inbound channel gone, stopping decode loop");
                        return state;
                    }
                    metrics::record_message();
                }
                Err(DecodeError::Cancelled) => {
                    tracing::debug!(connection_id = %peer.id(), peer_addr = %peer_addr, "Peer closed locally");
                    return state;
                }
                Err(e) => {
                    if matches!(e, DecodeError::Closed) {
                        tracing::debug!(connection_id = %peer.id(), peer_addr = %peer_addr, "Peer closed the stream");
                    } else {
                        tracing::warn!(connection_id = %peer.id(), peer_addr = %peer_addr, error = %e, "Decode error");
                    }
                    metrics::record_decode_error();
                    self.events.emit(TransportEvent::DecodeFailed { peer_addr, error: e.to_string() });
                    return state;
                }
            }
        }
    }
}

fn advance(state: &mut ConnectionState, next: ConnectionState, peer: &TcpPeer) {
    debug_assert!(state.can_transition_to(next), "illegal transition {:?} -> {:?}", state, next);
    tracing::trace!(connection_id = %peer.id(), from = ?state, to = ?next, "Connection state change");
    *state = next;
}
