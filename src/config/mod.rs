//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → NodeConfig (validated, immutable)
//!     → TransportConfig handed to TcpTransport at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the listen address cannot change under a running listener
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{DecoderConfig, DecoderKind, NodeConfig, ObservabilityConfig, TransportConfig};
