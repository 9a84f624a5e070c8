//! HTTP client that announces a relayed client through the PROXY protocol (v1).
//!
//! Every connection the client dials starts with a
//! `PROXY TCP4|TCP6 <client> <destination> <client-port> <destination-port>\r\n`
//! line, so an intermediary expecting the PROXY protocol sees the upstream
//! client this process is acting for instead of this process itself.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use bytes::Bytes;
//! use http_body_util::Empty;
//! use hyper_util::client::legacy::connect::HttpConnector;
//! use proxy_protocol_client::{ClientEndpoint, ProxyProtocolClient};
//!
//! let client: ProxyProtocolClient<HttpConnector, Empty<Bytes>> =
//!     ProxyProtocolClient::new(ClientEndpoint::new("192.0.2.42".parse()?, 31337));
//! let response = client.get("http://127.0.0.1:8080/".parse()?).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod net;
pub mod observability;
pub mod proxy_protocol;

pub use config::ClientConfig;
pub use http::ProxyProtocolClient;
pub use net::{DialError, ProxyProtocolConnector, RemoteEndpoint};
pub use proxy_protocol::{ClientEndpoint, ProxyHeader};

/// Boxed error accepted from wrapped connectors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
