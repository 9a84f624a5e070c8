//! PROXY protocol v1 header construction.
//!
//! # Responsibilities
//! - Hold the announced client endpoint
//! - Normalize IPv4-mapped IPv6 addresses to plain IPv4
//! - Pick TCP4 or TCP6 from the destination's address family
//! - Serialize through `ppp` into a single CRLF-terminated line
//!
//! # Design Decisions
//! - The destination decides the family; the client is converted to match
//! - An IPv6 client cannot be squeezed into a TCP4 line, that is an error
//! - Headers are values: built per dial, serialized once, then dropped

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use ppp::v1::Addresses;
use thiserror::Error;

/// Longest legal v1 header, CRLF included.
pub const V1_MAX_LENGTH: usize = 107;

/// The upstream endpoint announced as the PROXY source.
///
/// Fixed at construction and shared by every dial of one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientEndpoint {
    addr: SocketAddr,
}

impl ClientEndpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::new(ip, port),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn as_socket_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl From<SocketAddr> for ClientEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

impl fmt::Display for ClientEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

/// Transport family token of a v1 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFamily {
    Tcp4,
    Tcp6,
}

impl TransportFamily {
    /// Family of an already normalized address.
    pub fn of(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::Tcp4,
            IpAddr::V6(_) => Self::Tcp6,
        }
    }
}

impl fmt::Display for TransportFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp4 => f.write_str("TCP4"),
            Self::Tcp6 => f.write_str("TCP6"),
        }
    }
}

/// Header command. Outbound dials always announce a proxied connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Proxy,
}

/// Errors raised while building or serializing a header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// An endpoint cannot be expressed in the header's family.
    #[error("{endpoint} cannot be announced in a {family} header")]
    MalformedAddress {
        endpoint: SocketAddr,
        family: TransportFamily,
    },

    /// Serialized line exceeds the v1 length limit.
    #[error("PROXY v1 header is {0} bytes, limit is {limit}", limit = V1_MAX_LENGTH)]
    TooLong(usize),
}

/// Rewrite `::ffff:a.b.c.d` to `a.b.c.d`, leave everything else alone.
pub fn normalize_ip(ip: IpAddr) -> IpAddr {
    ip.to_canonical()
}

pub fn normalize_addr(addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(normalize_ip(addr.ip()), addr.port())
}

/// A PROXY protocol v1 header for one dialed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHeader {
    protocol_version: u8,
    command: Command,
    family: TransportFamily,
    source: SocketAddr,
    destination: SocketAddr,
}

impl ProxyHeader {
    /// Build the header announcing `client` as the source of a connection to `destination`.
    pub fn new(client: ClientEndpoint, destination: SocketAddr) -> Result<Self, HeaderError> {
        let destination = normalize_addr(destination);
        let family = TransportFamily::of(destination.ip());

        let source_ip = match (family, normalize_ip(client.ip())) {
            (TransportFamily::Tcp4, IpAddr::V4(ip)) => IpAddr::V4(ip),
            (TransportFamily::Tcp4, IpAddr::V6(_)) => {
                return Err(HeaderError::MalformedAddress {
                    endpoint: client.as_socket_addr(),
                    family,
                });
            }
            (TransportFamily::Tcp6, IpAddr::V4(ip)) => IpAddr::V6(ip.to_ipv6_mapped()),
            (TransportFamily::Tcp6, IpAddr::V6(ip)) => IpAddr::V6(ip),
        };

        Ok(Self {
            protocol_version: 1,
            command: Command::Proxy,
            family,
            source: SocketAddr::new(source_ip, client.port()),
            destination,
        })
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn family(&self) -> TransportFamily {
        self.family
    }

    pub fn source(&self) -> SocketAddr {
        self.source
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Serialize to the wire line `PROXY <family> <src> <dst> <sport> <dport>\r\n`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HeaderError> {
        let line = match Addresses::from((self.source, self.destination)) {
            addresses @ (Addresses::Tcp4(_) | Addresses::Tcp6(_)) => addresses.to_string(),
            Addresses::Unknown => {
                return Err(HeaderError::MalformedAddress {
                    endpoint: self.destination,
                    family: self.family,
                });
            }
        };

        if line.len() > V1_MAX_LENGTH {
            return Err(HeaderError::TooLong(line.len()));
        }
        Ok(line.into_bytes())
    }
}
