//! Connector that writes a PROXY protocol header on every new connection.
//!
//! # Responsibilities
//! - Delegate the dial to the wrapped connector, untouched
//! - Resolve the dialed connection's remote endpoint
//! - Build and write the header before anyone else sees the connection
//!
//! # Design Decisions
//! - No retries: any failure ends the dial attempt
//! - Connections are never closed here; errors hand them back
//! - Dropping the returned future cancels the dial and the header write alike
//! - The header write is additionally bounded by an optional timeout

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use hyper::rt::Write;
use hyper::Uri;
use hyper_util::rt::TokioIo;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tower::Service;

use crate::net::error::DialError;
use crate::proxy_protocol::{parse_endpoint, AddrParseReason, ClientEndpoint, ProxyHeader};
use crate::BoxError;

/// Access to the textual `host:port` of a connection's peer.
pub trait RemoteEndpoint {
    /// `None` when the peer address is unknown.
    fn remote_endpoint(&self) -> Option<String>;
}

impl RemoteEndpoint for TcpStream {
    fn remote_endpoint(&self) -> Option<String> {
        self.peer_addr().ok().map(|addr| addr.to_string())
    }
}

impl<T: RemoteEndpoint> RemoteEndpoint for TokioIo<T> {
    fn remote_endpoint(&self) -> Option<String> {
        self.inner().remote_endpoint()
    }
}

/// Wraps a connector so each connection starts with a PROXY v1 header
/// announcing a fixed client endpoint.
#[derive(Debug, Clone)]
pub struct ProxyProtocolConnector<C> {
    inner: C,
    client: ClientEndpoint,
    write_timeout: Option<Duration>,
}

impl<C> ProxyProtocolConnector<C> {
    pub fn new(inner: C, client: ClientEndpoint) -> Self {
        Self {
            inner,
            client,
            write_timeout: None,
        }
    }

    /// Bound the header write. `None` lets it run until the peer accepts it.
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn client_endpoint(&self) -> ClientEndpoint {
        self.client
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C> Service<Uri> for ProxyProtocolConnector<C>
where
    C: Service<Uri>,
    C::Response: Write + RemoteEndpoint + Unpin + Send + 'static,
    C::Error: Into<BoxError>,
    C::Future: Send + 'static,
{
    type Response = C::Response;
    type Error = DialError<C::Response>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(|e| DialError::DialFailed(e.into()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let client = self.client;
        let write_timeout = self.write_timeout;
        let dial = self.inner.call(dst.clone());

        Box::pin(async move {
            let conn = match dial.await {
                Ok(conn) => conn,
                Err(e) => {
                    let e = e.into();
                    tracing::warn!(uri = %dst, error = %e, "Dial failed");
                    return Err(DialError::DialFailed(e));
                }
            };
            announce(conn, client, write_timeout).await
        })
    }
}

/// Write the header for `client` onto a freshly dialed connection.
async fn announce<T>(
    mut conn: T,
    client: ClientEndpoint,
    write_timeout: Option<Duration>,
) -> Result<T, DialError<T>>
where
    T: Write + RemoteEndpoint + Unpin,
{
    let Some(raw) = conn.remote_endpoint() else {
        tracing::warn!(client = %client, "Dialed connection has no remote endpoint");
        return Err(DialError::NoRemoteEndpoint { conn });
    };

    let destination: SocketAddr = match parse_endpoint(&raw) {
        Ok(addr) => addr,
        Err(reason) => {
            tracing::warn!(remote = %raw, %reason, "Malformed remote endpoint");
            return Err(DialError::MalformedAddress { raw, reason, conn });
        }
    };

    let bytes = match ProxyHeader::new(client, destination).and_then(|h| h.to_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(remote = %raw, client = %client, error = %e, "Cannot build PROXY header");
            return Err(DialError::MalformedAddress {
                raw,
                reason: AddrParseReason::Unrepresentable,
                conn,
            });
        }
    };

    let written = match write_timeout {
        Some(limit) => match tokio::time::timeout(limit, write_header(&mut conn, &bytes)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out writing PROXY protocol header",
            )),
        },
        None => write_header(&mut conn, &bytes).await,
    };

    if let Err(source) = written {
        tracing::warn!(remote = %raw, error = %source, "Failed to write PROXY header");
        return Err(DialError::HeaderWriteFailed { source, conn });
    }

    tracing::debug!(
        remote = %destination,
        client = %client,
        header_len = bytes.len(),
        "PROXY header written"
    );
    Ok(conn)
}

/// Write all of `buf` and flush.
async fn write_header<W: Write + Unpin>(io: &mut W, buf: &[u8]) -> io::Result<()> {
    let mut io = TokioIo::new(io);
    io.write_all(buf).await?;
    io.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncWrite;
    use tower::{service_fn, ServiceExt};

    /// In-memory connection recording what was written to it.
    #[derive(Debug, Default)]
    struct FakeConn {
        remote: Option<String>,
        written: Vec<u8>,
        fail_writes: bool,
        stall_writes: bool,
        max_write: usize,
        flushes: usize,
    }

    impl FakeConn {
        fn to(remote: &str) -> Self {
            Self {
                remote: Some(remote.to_string()),
                ..Default::default()
            }
        }
    }

    impl RemoteEndpoint for FakeConn {
        fn remote_endpoint(&self) -> Option<String> {
            self.remote.clone()
        }
    }

    impl AsyncWrite for FakeConn {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.stall_writes {
                return Poll::Pending;
            }
            if self.fail_writes {
                return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
            }
            // short writes, 8 bytes unless narrowed
            let limit = if self.max_write == 0 { 8 } else { self.max_write };
            let n = buf.len().min(limit);
            self.written.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.flushes += 1;
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn client() -> ClientEndpoint {
        ClientEndpoint::new(Ipv4Addr::new(192, 0, 2, 42).into(), 31337)
    }

    fn uri() -> Uri {
        Uri::from_static("http://upstream.test/")
    }

    async fn dial(conn: FakeConn) -> Result<TokioIo<FakeConn>, DialError<TokioIo<FakeConn>>> {
        dial_with_timeout(conn, None).await
    }

    async fn dial_with_timeout(
        conn: FakeConn,
        timeout: Option<Duration>,
    ) -> Result<TokioIo<FakeConn>, DialError<TokioIo<FakeConn>>> {
        let conn = std::sync::Mutex::new(Some(conn));
        let inner = service_fn(move |_: Uri| {
            let conn = conn.lock().unwrap().take().expect("dialed once");
            async move { Ok::<_, io::Error>(TokioIo::new(conn)) }
        });
        ProxyProtocolConnector::new(inner, client())
            .with_write_timeout(timeout)
            .oneshot(uri())
            .await
    }

    #[tokio::test]
    async fn writes_header_before_returning() {
        let conn = dial(FakeConn::to("127.0.0.1:8080")).await.unwrap();
        assert_eq!(
            conn.into_inner().written,
            b"PROXY TCP4 192.0.2.42 127.0.0.1 31337 8080\r\n"
        );
    }

    #[tokio::test]
    async fn mapped_remote_is_announced_as_tcp4() {
        let conn = dial(FakeConn::to("[::ffff:198.51.100.7]:443")).await.unwrap();
        assert_eq!(
            conn.into_inner().written,
            b"PROXY TCP4 192.0.2.42 198.51.100.7 31337 443\r\n"
        );
    }

    #[tokio::test]
    async fn ipv6_remote_is_announced_as_tcp6() {
        let conn = dial(FakeConn::to("[2001:db8::7]:443")).await.unwrap();
        assert_eq!(
            conn.into_inner().written,
            b"PROXY TCP6 ::ffff:192.0.2.42 2001:db8::7 31337 443\r\n"
        );
    }

    #[tokio::test]
    async fn dial_failure_is_returned_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = service_fn(move |_: Uri| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<TokioIo<FakeConn>, _>(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "refused",
                ))
            }
        });

        let err = ProxyProtocolConnector::new(inner, client())
            .oneshot(uri())
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.connection().is_none());
        assert_eq!(err.to_string(), "refused");
        match err {
            DialError::DialFailed(source) => {
                let io_err = source.downcast_ref::<io::Error>().expect("io error");
                assert_eq!(io_err.kind(), io::ErrorKind::ConnectionRefused);
                assert_eq!(io_err.to_string(), "refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn header_survives_a_connection_that_accepts_one_byte_at_a_time() {
        let conn = FakeConn {
            max_write: 1,
            ..FakeConn::to("127.0.0.1:8080")
        };

        let conn = dial(conn).await.unwrap().into_inner();
        assert_eq!(conn.written, b"PROXY TCP4 192.0.2.42 127.0.0.1 31337 8080\r\n");
        assert_eq!(conn.flushes, 1);
    }

    #[tokio::test]
    async fn missing_remote_endpoint_hands_connection_back() {
        let err = dial(FakeConn::default()).await.unwrap_err();
        assert!(matches!(err, DialError::NoRemoteEndpoint { .. }));

        let conn = err.into_connection().expect("connection returned");
        assert!(conn.into_inner().written.is_empty());
    }

    #[tokio::test]
    async fn malformed_remote_endpoint_hands_connection_back() {
        for (raw, expected) in [
            ("127.0.0.1", AddrParseReason::MissingPort),
            ("127.0.0.1:http", AddrParseReason::InvalidPort),
            ("not-an-ip:80", AddrParseReason::InvalidHost),
        ] {
            let err = dial(FakeConn::to(raw)).await.unwrap_err();
            assert!(err.to_string().contains(raw), "{err}");
            match err {
                DialError::MalformedAddress { raw: got, reason, conn } => {
                    assert_eq!(got, raw);
                    assert_eq!(reason, expected);
                    assert!(conn.into_inner().written.is_empty());
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn unrepresentable_client_family_is_malformed() {
        let inner = service_fn(|_: Uri| async {
            Ok::<_, io::Error>(TokioIo::new(FakeConn::to("10.0.0.1:80")))
        });
        let v6_client = ClientEndpoint::new("2001:db8::42".parse().unwrap(), 1);

        let err = ProxyProtocolConnector::new(inner, v6_client)
            .oneshot(uri())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DialError::MalformedAddress {
                reason: AddrParseReason::Unrepresentable,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn write_failure_hands_connection_back() {
        let conn = FakeConn {
            fail_writes: true,
            ..FakeConn::to("127.0.0.1:8080")
        };

        let err = dial(conn).await.unwrap_err();
        match &err {
            DialError::HeaderWriteFailed { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.into_connection().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_write_times_out() {
        let conn = FakeConn {
            stall_writes: true,
            ..FakeConn::to("127.0.0.1:8080")
        };

        let err = dial_with_timeout(conn, Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        match err {
            DialError::HeaderWriteFailed { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::TimedOut);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn connector_is_clone_and_keeps_endpoint() {
        let http = hyper_util::client::legacy::connect::HttpConnector::new();
        let connector = ProxyProtocolConnector::new(http, client());
        let copy = connector.clone();
        assert_eq!(copy.client_endpoint(), client());
    }
}
