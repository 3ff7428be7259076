//! The shared inbound message channel.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::message::Rpc;

/// Messages buffered between the decode loops and the consumer.
///
/// Tokio channels need at least one slot; a single slot keeps the hand-off as
/// close to a rendezvous as the runtime allows.
pub const INBOUND_CHANNEL_CAPACITY: usize = 1;

pub(crate) fn channel() -> (mpsc::Sender<Rpc>, RpcReceiver) {
    let (tx, rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
    (tx, RpcReceiver { inner: Arc::new(Mutex::new(rx)) })
}

/// Receiving end of the inbound channel.
///
/// Clones share one queue: every message is delivered to exactly one caller.
#[derive(Debug, Clone)]
pub struct RpcReceiver {
    inner: Arc<Mutex<mpsc::Receiver<Rpc>>>,
}

impl RpcReceiver {
    /// Wait for the next message. Returns `None` only once the transport and
    /// all of its connection tasks are gone.
    pub async fn recv(&self) -> Option<Rpc> {
        self.inner.lock().await.recv().await
    }

    /// Take a message if one is ready, without waiting.
    pub fn try_recv(&self) -> Option<Rpc> {
        self.inner.try_lock().ok()?.try_recv().ok()
    }
}
