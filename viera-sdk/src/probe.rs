//! Reachability probing
//!
//! The controller only needs a yes/no answer with bounded latency. Anything
//! other than an affirmative result, including an error, counts as unreachable.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;
use viera_api::DEFAULT_PORT;

/// Result of one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub alive: bool,
}

impl ProbeResult {
    pub fn alive() -> Self {
        Self { alive: true }
    }

    pub fn unreachable() -> Self {
        Self { alive: false }
    }
}

/// Checks whether a television answers on the network
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, ip: Ipv4Addr) -> std::io::Result<ProbeResult>;
}

/// Probes by opening a TCP connection to the control port
#[derive(Debug, Clone)]
pub struct TcpProber {
    port: u16,
    timeout: Duration,
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpProber {
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(2),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, ip: Ipv4Addr) -> std::io::Result<ProbeResult> {
        match tokio::time::timeout(self.timeout, TcpStream::connect((ip, self.port))).await {
            Ok(Ok(_stream)) => Ok(ProbeResult::alive()),
            Ok(Err(e)) => {
                debug!(%ip, port = self.port, error = %e, "probe connect failed");
                Ok(ProbeResult::unreachable())
            }
            Err(_) => {
                debug!(%ip, port = self.port, timeout = ?self.timeout, "probe timed out");
                Ok(ProbeResult::unreachable())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_listening_port_is_alive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = TcpProber::new().with_port(port);
        assert_eq!(prober.probe(Ipv4Addr::LOCALHOST).await.unwrap(), ProbeResult::alive());
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = TcpProber::new()
            .with_port(port)
            .with_timeout(Duration::from_millis(500));
        assert!(!prober.probe(Ipv4Addr::LOCALHOST).await.unwrap().alive);
    }
}
