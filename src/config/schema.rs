//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every section falls back to defaults, so an empty file is a valid config.

use serde::{Deserialize, Serialize};

use crate::codec::chunk::DEFAULT_BUFFER_SIZE;
use crate::codec::length_prefixed::DEFAULT_MAX_FRAME_SIZE;

/// Root configuration for a transport node.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NodeConfig {
    /// Listener and dialing settings.
    pub transport: TransportConfig,

    /// Which reference decoder the node binary installs.
    pub decoder: DecoderConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Listen address (e.g., "0.0.0.0:3000"), passed through to the socket layer.
    pub listen_address: String,

    /// First delay after a failed accept, in milliseconds.
    pub accept_backoff_base_ms: u64,

    /// Upper bound on the accept backoff, in milliseconds.
    pub accept_backoff_max_ms: u64,

    /// Peers the node binary dials once at startup.
    pub bootstrap_peers: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:3000".to_string(),
            accept_backoff_base_ms: 5,
            accept_backoff_max_ms: 1000,
            bootstrap_peers: Vec::new(),
        }
    }
}

/// Reference decoder selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    #[default]
    LengthPrefixed,
    Chunk,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub kind: DecoderKind,

    /// Largest accepted frame payload for `length_prefixed`.
    pub max_frame_size: usize,

    /// Read buffer size for `chunk`.
    pub buffer_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            kind: DecoderKind::LengthPrefixed,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("text" or "json").
    pub log_format: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
