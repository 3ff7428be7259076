//! Configuration validation.
//!
//! Semantic checks that serde cannot express. All failures are collected so
//! an operator sees every problem in one pass.

use std::net::SocketAddr;

use crate::config::schema::NodeConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &NodeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.transport.listen_address.trim().is_empty() {
        errors.push(ValidationError::new("transport.listen_address", "must not be empty"));
    }

    if config.transport.accept_backoff_base_ms > config.transport.accept_backoff_max_ms {
        errors.push(ValidationError::new(
            "transport.accept_backoff_base_ms",
            format!(
                "{} exceeds accept_backoff_max_ms ({})",
                config.transport.accept_backoff_base_ms, config.transport.accept_backoff_max_ms
            ),
        ));
    }

    for peer in &config.transport.bootstrap_peers {
        if peer.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "transport.bootstrap_peers",
                format!("'{}' is not a socket address", peer),
            ));
        }
    }

    if config.decoder.max_frame_size == 0 {
        errors.push(ValidationError::new("decoder.max_frame_size", "must be greater than zero"));
    }
    if config.decoder.buffer_size == 0 {
        errors.push(ValidationError::new("decoder.buffer_size", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "text" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
