//! Single-read chunk decoder.
//!
//! Each call performs one read and treats whatever arrived as one message.
//! Message boundaries therefore follow the sender's write pattern and the
//! network, which is fine for interactive or best-effort traffic only.

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use super::{ByteStream, Decoder};
use crate::error::DecodeError;
use crate::message::Rpc;

pub const DEFAULT_BUFFER_SIZE: usize = 1028;

#[derive(Debug, Clone)]
pub struct ChunkDecoder {
    buffer_size: usize,
}

impl ChunkDecoder {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size }
    }
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

#[async_trait]
impl Decoder for ChunkDecoder {
    async fn decode(&self, reader: &mut ByteStream<'_>, msg: &mut Rpc) -> Result<(), DecodeError> {
        let mut buf = vec![0u8; self.buffer_size];
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Err(DecodeError::Closed);
        }
        buf.truncate(n);
        msg.payload = buf;
        Ok(())
    }
}
