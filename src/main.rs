//! Peer transport node.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                   TcpTransport                     │
//!   remote dials ─────┼─▶ listener ──┐                                     │
//!                     │              ├─▶ connection task (one per peer)    │
//!   dial(addr) ───────┼──────────────┘     handshake → on_peer → decode    │
//!                     │                                  │                 │
//!                     │                                  ▼                 │
//!                     │                         inbound channel ───────────┼─▶ consume()
//!                     │                                                    │
//!                     │   config · observability · lifecycle · resilience  │
//!                     └───────────────────────────────────────────────────┘
//! ```
//!
//! The binary wires the transport with a no-op handshake and logs every
//! message it receives. The real upper layer is expected to embed the library.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use peer_transport::config::{load_config, NodeConfig};
use peer_transport::lifecycle::{signals::shutdown_signal, startup};
use peer_transport::observability::{logging::init_tracing, metrics::init_metrics};
use peer_transport::{Peer, PeerRejected, TcpTransport, Transport};

#[derive(Parser)]
#[command(name = "peer-transport")]
#[command(about = "Run a peer-to-peer transport node", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address from the config
    #[arg(short, long)]
    listen: Option<String>,
}

fn announce_peer(peer: Arc<dyn Peer>) -> Result<(), PeerRejected> {
    tracing::info!(
        peer_addr = %peer.remote_addr(),
        outbound = peer.is_outbound(),
        "Peer ready"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => NodeConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.transport.listen_address = listen;
    }

    init_tracing(&config.observability)?;
    tracing::info!("peer-transport v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        listen_address = %config.transport.listen_address,
        decoder = ?config.decoder.kind,
        bootstrap_peers = config.transport.bootstrap_peers.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let transport = TcpTransport::new(startup::transport_opts(&config).with_on_peer(Arc::new(announce_peer)));
    startup::start(&transport, &config).await?;

    let inbound = transport.consume();
    let signal = shutdown_signal();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            Some(rpc) = inbound.recv() => {
                tracing::info!(from = %rpc.from, bytes = rpc.payload.len(), "Message received");
            }
            _ = &mut signal => break,
            else => break,
        }
    }

    transport.close().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
