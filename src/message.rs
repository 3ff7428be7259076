//! Inbound application messages.

use std::net::{Ipv4Addr, SocketAddr};

/// One decoded message together with the address of the connection it came from.
///
/// `from` is always overwritten by the transport after decoding, so nothing a
/// decoder writes there, and nothing in the payload, can forge the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rpc {
    pub from: SocketAddr,
    pub payload: Vec<u8>,
}

impl Default for Rpc {
    fn default() -> Self {
        Self {
            from: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            payload: Vec::new(),
        }
    }
}
