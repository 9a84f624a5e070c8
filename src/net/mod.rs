//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! hyper-util pool needs a connection
//!     → connector.rs (ProxyProtocolConnector::call)
//!     → wrapped connector dials (HttpConnector by default)
//!     → remote endpoint resolved and parsed
//!     → PROXY v1 header written
//!     → connection handed back to the pool
//! ```
//!
//! # Design Decisions
//! - Exactly one header per connection, written before the pool sees it
//! - Failures after the dial carry the connection inside the error
//! - No state shared between dials besides immutable configuration

pub mod connector;
pub mod error;

pub use connector::{ProxyProtocolConnector, RemoteEndpoint};
pub use error::DialError;
