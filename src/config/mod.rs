//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or CLI flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → ProxyProtocolClient::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a client is built from it once
//! - All fields but the announced client endpoint have defaults
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClientConfig, ClientEndpointConfig, ObservabilityConfig, TransportConfig};
pub use validation::{validate_config, ValidationError};
