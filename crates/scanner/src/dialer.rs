// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound dial abstraction.
//!
//! A probe is a TCP connect followed by an immediate close; nothing is
//! written on the wire. The scanner takes the dialer as `Arc<dyn Dialer>`
//! so hosts can route probes through their SOCKS proxy (typically a Tor
//! client) and tests can script outcomes.

use async_trait::async_trait;
use tokio::net::TcpStream;

/// Connects to `host:port` and drops the connection.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, host_port: &str) -> std::io::Result<()>;
}

/// Plain TCP dialer, for clearnet catalogs and local testing.
#[derive(Debug, Clone, Default)]
pub struct DirectDialer;

#[async_trait]
impl Dialer for DirectDialer {
    async fn dial(&self, host_port: &str) -> std::io::Result<()> {
        let stream = TcpStream::connect(host_port).await?;
        drop(stream);
        Ok(())
    }
}

/// Dials through a SOCKS5 proxy.
#[derive(Debug, Clone)]
pub struct SocksDialer {
    proxy_addr: String,
}

impl SocksDialer {
    pub fn new(proxy_addr: impl Into<String>) -> Self {
        Self { proxy_addr: proxy_addr.into() }
    }
}

#[async_trait]
impl Dialer for SocksDialer {
    async fn dial(&self, host_port: &str) -> std::io::Result<()> {
        let (host, port) = split_host_port(host_port)?;
        let stream =
            tokio_socks::tcp::Socks5Stream::connect(self.proxy_addr.as_str(), (host, port))
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e))?;
        drop(stream);
        Ok(())
    }
}

/// Split `host:port` for the SOCKS target tuple.
fn split_host_port(host_port: &str) -> std::io::Result<(&str, u16)> {
    let (host, port) = host_port.rsplit_once(':').ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("missing port: {host_port}"))
    })?;
    let port = port.parse::<u16>().map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid port: {host_port}"))
    })?;
    Ok((host, port))
}

#[cfg(test)]
#[path = "dialer_tests.rs"]
mod tests;
