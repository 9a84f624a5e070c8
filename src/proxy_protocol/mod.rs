//! PROXY protocol v1 header building.
//!
//! # Data Flow
//! ```text
//! remote endpoint string ("198.51.100.7:443", "[::1]:80")
//!     → endpoint.rs (split host/port, parse IP literal)
//!     → header.rs (normalize mapped IPv4, pick TCP4/TCP6)
//!     → ppp v1 encoder
//!     → "PROXY TCP4 <src> <dst> <sport> <dport>\r\n"
//! ```

pub mod endpoint;
pub mod header;

pub use endpoint::{parse_endpoint, AddrParseReason};
pub use header::{
    normalize_addr, normalize_ip, ClientEndpoint, Command, HeaderError, ProxyHeader,
    TransportFamily, V1_MAX_LENGTH,
};
