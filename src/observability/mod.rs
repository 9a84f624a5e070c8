//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! net::connector, http::client
//!     → tracing events (dial failures, header writes)
//!     → logging.rs subscriber (binary only)
//!     → stderr
//! ```

pub mod logging;

pub use logging::init_logging;
