//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated `NodeConfig` into transport options
//! - Bind the listener
//! - Dial configured bootstrap peers once

use std::sync::Arc;

use crate::codec::{ChunkDecoder, Decoder, LengthPrefixedDecoder};
use crate::config::{DecoderConfig, DecoderKind, NodeConfig};
use crate::error::TransportError;
use crate::transport::{TcpTransport, TcpTransportOpts, Transport};

/// Instantiate the reference decoder named by the config.
pub fn build_decoder(config: &DecoderConfig) -> Arc<dyn Decoder> {
    match config.kind {
        DecoderKind::LengthPrefixed => Arc::new(LengthPrefixedDecoder::new(config.max_frame_size)),
        DecoderKind::Chunk => Arc::new(ChunkDecoder::new(config.buffer_size)),
    }
}

/// Transport options for `config`; callers layer their handshake and callback on top.
pub fn transport_opts(config: &NodeConfig) -> TcpTransportOpts {
    TcpTransportOpts::from_config(&config.transport).with_decoder(build_decoder(&config.decoder))
}

/// Start listening, then dial every bootstrap peer.
///
/// Returns how many bootstrap dials succeeded. A bind failure aborts before
/// any dial is attempted.
pub async fn start(transport: &TcpTransport, config: &NodeConfig) -> Result<usize, TransportError> {
    transport.listen_and_accept().await?;

    let mut connected = 0;
    for peer in &config.transport.bootstrap_peers {
        match transport.dial(peer).await {
            Ok(()) => {
                tracing::info!(peer = %peer, "Connected to bootstrap peer");
                connected += 1;
            }
            Err(e) => tracing::warn!(peer = %peer, error = %e, "Bootstrap dial failed"),
        }
    }

    Ok(connected)
}
