//! `ppc`: issue an HTTP GET that announces a relayed client via the PROXY protocol.
//!
//! ```text
//! ppc --client-ip 192.0.2.42 --client-port 31337 http://127.0.0.1:8080/
//! ppc --config ppc.toml http://127.0.0.1:8080/
//! ```
//!
//! Flags override values from the config file.

use std::net::IpAddr;
use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Empty};
use hyper::Uri;
use hyper_util::client::legacy::connect::HttpConnector;

use proxy_protocol_client::config::{load_config, validate_config, ClientConfig, ConfigError};
use proxy_protocol_client::observability::init_logging;
use proxy_protocol_client::ProxyProtocolClient;

#[derive(Parser)]
#[command(name = "ppc")]
#[command(about = "HTTP GET through a connection that starts with a PROXY protocol v1 header", long_about = None)]
struct Cli {
    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IP announced as the PROXY source.
    #[arg(long)]
    client_ip: Option<IpAddr>,

    /// Port announced as the PROXY source.
    #[arg(long)]
    client_port: Option<u16>,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,

    /// URL to fetch.
    url: Uri,
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match (&cli.config, cli.client_ip, cli.client_port) {
        (Some(path), _, _) => load_config(path)?,
        (None, Some(ip), Some(port)) => ClientConfig::new(ip, port),
        (None, _, _) => {
            return Err("either --config or both --client-ip and --client-port are required".into());
        }
    };

    if let Some(ip) = cli.client_ip {
        config.client.ip = ip;
    }
    if let Some(port) = cli.client_port {
        config.client.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(&config.observability.log_level);

    tracing::info!(
        client_ip = %config.client.ip,
        client_port = config.client.port,
        url = %cli.url,
        "Sending request"
    );

    let client: ProxyProtocolClient<HttpConnector, Empty<Bytes>> =
        ProxyProtocolClient::from_config(&config);

    let response = client.get(cli.url.clone()).await?;
    let status = response.status();
    let version = response.version();
    let body = response.into_body().collect().await?.to_bytes();

    println!("{:?} {}", version, status);
    println!("{}", String::from_utf8_lossy(&body));

    tracing::info!(status = %status, bytes = body.len(), "Request complete");
    Ok(())
}
