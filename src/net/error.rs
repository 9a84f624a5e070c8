//! Dial-time errors of the PROXY protocol connector.

use std::io;

use thiserror::Error;

use crate::proxy_protocol::AddrParseReason;
use crate::BoxError;

/// Errors returned by [`ProxyProtocolConnector`](super::ProxyProtocolConnector).
///
/// Every variant raised after a successful dial carries the live connection,
/// so the caller decides whether to close or inspect it.
#[derive(Debug, Error)]
pub enum DialError<T> {
    /// The wrapped connector failed; its error passes through as is.
    #[error(transparent)]
    DialFailed(BoxError),

    /// The connection did not report a remote endpoint.
    #[error("dialed connection has no remote endpoint")]
    NoRemoteEndpoint { conn: T },

    /// The remote endpoint could not be parsed or announced.
    #[error("dialed connection reported malformed address '{raw}': {reason}")]
    MalformedAddress {
        raw: String,
        reason: AddrParseReason,
        conn: T,
    },

    /// Writing the header to the connection failed.
    #[error("writing PROXY protocol header: {source}")]
    HeaderWriteFailed {
        #[source]
        source: io::Error,
        conn: T,
    },
}

impl<T> DialError<T> {
    /// The established connection, if the dial itself succeeded.
    pub fn connection(&self) -> Option<&T> {
        match self {
            Self::DialFailed(_) => None,
            Self::NoRemoteEndpoint { conn }
            | Self::MalformedAddress { conn, .. }
            | Self::HeaderWriteFailed { conn, .. } => Some(conn),
        }
    }

    /// Take back ownership of the established connection.
    pub fn into_connection(self) -> Option<T> {
        match self {
            Self::DialFailed(_) => None,
            Self::NoRemoteEndpoint { conn }
            | Self::MalformedAddress { conn, .. }
            | Self::HeaderWriteFailed { conn, .. } => Some(conn),
        }
    }

    pub fn is_dial_failed(&self) -> bool {
        matches!(self, Self::DialFailed(_))
    }
}
