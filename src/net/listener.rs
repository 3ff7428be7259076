//! TCP listener and accept loop.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections until told to stop
//! - Tolerate and pace accept errors

use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::error::TransportError;
use crate::observability::{metrics, EventBus, TransportEvent};
use crate::resilience::AcceptBackoff;

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address`, passed to the socket layer unmodified.
    pub async fn bind(address: &str) -> Result<Self, TransportError> {
        let inner = TcpListener::bind(address).await.map_err(|source| TransportError::Bind {
            addr: address.to_string(),
            source,
        })?;

        let local_addr = inner.local_addr().map_err(|source| TransportError::Bind {
            addr: address.to_string(),
            source,
        })?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` fires, handing each one to `on_accept`.
    ///
    /// `on_accept` must not block; it is expected to spawn. The listening
    /// socket is dropped when this returns, so no accept happens afterwards.
    pub async fn run<F>(
        self,
        mut shutdown: broadcast::Receiver<()>,
        mut backoff: AcceptBackoff,
        events: EventBus,
        mut on_accept: F,
    ) where
        F: FnMut(TcpStream, SocketAddr),
    {
        loop {
            let accepted = tokio::select! {
                biased;
                // A dropped sender also means the transport is gone
                _ = shutdown.recv() => break,
                res = self.inner.accept() => res,
            };

            match accepted {
                Ok((stream, peer_addr)) => {
                    backoff.reset();
                    tracing::debug!(peer_addr = %peer_addr, "Connection accepted");
                    on_accept(stream, peer_addr);
                }
                Err(e) => {
                    let delay = backoff.on_failure();
                    tracing::warn!(
                        error = %e,
                        consecutive_failures = backoff.consecutive_failures(),
                        delay_ms = delay.as_millis() as u64,
                        "Accept failed"
                    );
                    metrics::record_accept_error();
                    events.emit(TransportEvent::AcceptFailed { error: e.to_string() });

                    tokio::select! {
                        biased;
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::info!(address = %self.local_addr, "Listener closed");
        events.emit(TransportEvent::ListenerClosed);
    }
}
