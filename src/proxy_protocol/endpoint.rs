//! Parsing of the textual remote endpoint a dialed connection reports.
//!
//! # Responsibilities
//! - Split `host:port` (IPv6 hosts in brackets) into address and port
//! - Reject hosts that are not IP literals
//! - Report which part of the string was wrong
//!
//! # Design Decisions
//! - Hostnames are never resolved here; a dialed connection always knows its peer IP
//! - Zone identifiers (`fe80::1%eth0`) are rejected, the PROXY line cannot carry them

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Why a remote endpoint string could not be turned into a socket address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddrParseReason {
    /// No `:port` suffix.
    #[error("missing port")]
    MissingPort,

    /// Port is empty, not numeric, or out of range.
    #[error("invalid port")]
    InvalidPort,

    /// Host is not an IPv4 or IPv6 literal.
    #[error("invalid host")]
    InvalidHost,

    /// The address parsed but cannot be expressed in a PROXY v1 header.
    #[error("not representable in a PROXY v1 header")]
    Unrepresentable,
}

/// Parse a `host:port` or `[v6host]:port` string into a [`SocketAddr`].
pub fn parse_endpoint(raw: &str) -> Result<SocketAddr, AddrParseReason> {
    let (host, port) = split_host_port(raw)?;

    let port: u16 = port.parse().map_err(|_| AddrParseReason::InvalidPort)?;
    let ip: IpAddr = host.parse().map_err(|_| AddrParseReason::InvalidHost)?;

    Ok(SocketAddr::new(ip, port))
}

fn split_host_port(raw: &str) -> Result<(&str, &str), AddrParseReason> {
    if let Some(rest) = raw.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or(AddrParseReason::InvalidHost)?;
        let port = after.strip_prefix(':').ok_or(AddrParseReason::MissingPort)?;
        return Ok((host, port));
    }

    let (host, port) = raw.rsplit_once(':').ok_or(AddrParseReason::MissingPort)?;
    if host.contains(':') {
        // unbracketed IPv6, the port boundary is ambiguous
        return Err(AddrParseReason::InvalidHost);
    }
    Ok((host, port))
}
