//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! caller builds Request
//!     → client.rs (ProxyProtocolClient::request, unchanged delegation)
//!     → hyper-util pool (reuse idle connection, or dial)
//!     → net::ProxyProtocolConnector (header written on new connections only)
//!     → request/response over the connection
//! ```

pub mod client;

pub use client::{default_connector, ProxyProtocolClient};
