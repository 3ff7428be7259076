//! Length-prefixed framing.
//!
//! Frames are laid out as:
//! - 4 bytes: big-endian payload length
//! - N bytes: payload

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use super::{ByteStream, Decoder};
use crate::error::DecodeError;
use crate::message::Rpc;

/// Header size: 4 bytes length.
pub const HEADER_SIZE: usize = 4;

/// Default upper bound on a single payload.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Decoder for length-prefixed frames.
#[derive(Debug, Clone)]
pub struct LengthPrefixedDecoder {
    max_frame_size: usize,
}

impl LengthPrefixedDecoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for LengthPrefixedDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

#[async_trait]
impl Decoder for LengthPrefixedDecoder {
    async fn decode(&self, reader: &mut ByteStream<'_>, msg: &mut Rpc) -> Result<(), DecodeError> {
        let mut header = [0u8; HEADER_SIZE];
        let mut filled = 0;

        // EOF before the first header byte is a clean close, anywhere else it is truncation
        while filled < HEADER_SIZE {
            let n = reader.read(&mut header[filled..]).await?;
            if n == 0 {
                return Err(if filled == 0 {
                    DecodeError::Closed
                } else {
                    DecodeError::Io(std::io::ErrorKind::UnexpectedEof.into())
                });
            }
            filled += n;
        }

        let length = u32::from_be_bytes(header) as usize;
        if length > self.max_frame_size {
            return Err(DecodeError::FrameTooLarge {
                size: length,
                max: self.max_frame_size,
            });
        }

        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload).await?;
        msg.payload = payload;
        Ok(())
    }
}

/// Build a frame for `payload`.
pub fn encode_frame(payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let length = u32::try_from(payload.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("payload of {} bytes does not fit a frame header", payload.len()),
        )
    })?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}
