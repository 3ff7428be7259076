//! Message decoding.
//!
//! # Data Flow
//! ```text
//! Connection read half
//!     → Decoder::decode (one call per message)
//!     → Rpc { payload } (origin stamped later by the transport)
//! ```
//!
//! The transport only knows the [`Decoder`] trait. Two reference decoders are
//! provided: [`LengthPrefixedDecoder`] for framed streams and [`ChunkDecoder`]
//! for raw single-read chunks.

pub mod chunk;
pub mod length_prefixed;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::DecodeError;
use crate::message::Rpc;

pub use chunk::ChunkDecoder;
pub use length_prefixed::{encode_frame, LengthPrefixedDecoder};

/// Readable byte stream handed to decoders.
pub type ByteStream<'a> = dyn AsyncRead + Unpin + Send + 'a;

/// Turns a byte stream into discrete messages.
///
/// Implementations are shared by every connection of a transport and must
/// not keep per-connection state between calls.
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Read exactly one message from `reader` into `msg`.
    async fn decode(&self, reader: &mut ByteStream<'_>, msg: &mut Rpc) -> Result<(), DecodeError>;
}
