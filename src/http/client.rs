//! HTTP client that announces a relayed client on every new connection.
//!
//! # Responsibilities
//! - Build the PROXY protocol connector, then a hyper-util client over it
//! - Apply the documented transport defaults explicitly
//! - Delegate every request unchanged
//!
//! # Design Decisions
//! - No protocol logic here; headers are the connector's job
//! - Pooling, keep-alive and HTTP version handling are hyper-util's
//! - TLS, when wanted, wraps the PROXY connector so the header precedes the handshake

use std::fmt::Debug;
use std::task::{Context, Poll};

use hyper::body::{Body, Incoming};
use hyper::rt::{Read, Write};
use hyper::{Request, Response, Uri};
use hyper_util::client::legacy::connect::{Connection, HttpConnector};
use hyper_util::client::legacy::{Client, Error, ResponseFuture};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tower::Service;

use crate::config::{ClientConfig, TransportConfig};
use crate::net::{ProxyProtocolConnector, RemoteEndpoint};
use crate::proxy_protocol::ClientEndpoint;
use crate::BoxError;

/// Build the plain TCP connector used when the caller supplies none.
pub fn default_connector(config: &TransportConfig) -> HttpConnector {
    let mut http = HttpConnector::new();
    http.set_connect_timeout(Some(config.connect_timeout()));
    http.set_keepalive(Some(config.keepalive()));
    http.set_nodelay(true);
    http
}

/// Round-trips requests through a pool whose connections start with a PROXY header.
#[derive(Debug, Clone)]
pub struct ProxyProtocolClient<C, B> {
    inner: Client<ProxyProtocolConnector<C>, B>,
    client: ClientEndpoint,
}

impl<B> ProxyProtocolClient<HttpConnector, B>
where
    B: Body + Send + 'static + Unpin,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    /// Client announcing `client`, with default transport settings.
    pub fn new(client: ClientEndpoint) -> Self {
        Self::with_transport(client, &TransportConfig::default())
    }

    /// Client announcing `client`, dialing plain TCP with `config`.
    pub fn with_transport(client: ClientEndpoint, config: &TransportConfig) -> Self {
        Self::with_connector(default_connector(config), client, config)
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_transport(config.client.into(), &config.transport)
    }
}

impl<C, B> ProxyProtocolClient<C, B>
where
    C: Service<Uri> + Clone + Send + Sync + 'static,
    C::Response: Read + Write + Connection + RemoteEndpoint + Debug + Unpin + Send + Sync + 'static,
    C::Error: Into<BoxError>,
    C::Future: Send + 'static,
    B: Body + Send + 'static + Unpin,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    /// Wrap a caller-built connector; pool settings still come from `config`.
    pub fn with_connector(connector: C, client: ClientEndpoint, config: &TransportConfig) -> Self {
        let connector = ProxyProtocolConnector::new(connector, client)
            .with_write_timeout(Some(config.header_write_timeout()));

        let inner = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.idle_timeout())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .http2_only(config.http2_only)
            .build(connector);

        tracing::debug!(
            client = %client,
            connect_timeout_secs = config.connect_timeout_secs,
            max_idle_per_host = config.max_idle_per_host,
            http2_only = config.http2_only,
            "PROXY protocol client configured"
        );

        Self { inner, client }
    }

    /// Send a request; the first dial to its authority writes the header.
    pub fn request(&self, req: Request<B>) -> ResponseFuture {
        self.inner.request(req)
    }

    pub fn get(&self, uri: Uri) -> ResponseFuture
    where
        B: Default,
    {
        self.inner.get(uri)
    }

    pub fn client_endpoint(&self) -> ClientEndpoint {
        self.client
    }
}

impl<C, B> Service<Request<B>> for ProxyProtocolClient<C, B>
where
    C: Service<Uri> + Clone + Send + Sync + 'static,
    C::Response: Read + Write + Connection + RemoteEndpoint + Debug + Unpin + Send + Sync + 'static,
    C::Error: Into<BoxError>,
    C::Future: Send + 'static,
    B: Body + Send + 'static + Unpin,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response<Incoming>;
    type Error = Error;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Service::poll_ready(&mut self.inner, cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        Service::call(&mut self.inner, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Empty;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn default_connector_is_wrapped() {
        let endpoint = ClientEndpoint::new(Ipv4Addr::new(192, 0, 2, 42).into(), 31337);
        let client: ProxyProtocolClient<HttpConnector, Empty<Bytes>> =
            ProxyProtocolClient::new(endpoint);

        assert_eq!(client.client_endpoint(), endpoint);
    }

    #[tokio::test]
    async fn built_from_config() {
        let mut config = ClientConfig::new(Ipv4Addr::new(198, 51, 100, 1).into(), 4000);
        config.transport.http2_only = true;

        let client: ProxyProtocolClient<HttpConnector, Empty<Bytes>> =
            ProxyProtocolClient::from_config(&config);

        assert_eq!(client.client_endpoint().port(), 4000);
    }
}
