//! Narrow interface to the pre-established anonymizing tunnel.
//!
//! The tunnel process (Tor, an I2P router, a VPN chain) lives outside this
//! crate; the core only asks two questions of it: where is the endpoint, and
//! is it usable right now.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ProxyConfig;

/// Connection parameters of a local SOCKS-style tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelEndpoint {
    pub host: String,
    pub port: u16,
}

impl TunnelEndpoint {
    #[must_use]
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            host: config.socks_host.clone(),
            port: config.socks_port,
        }
    }

    /// Proxy URL with remote DNS resolution, so hidden-service hostnames
    /// are resolved inside the tunnel and never leak to the local resolver.
    #[must_use]
    pub fn socks_url(&self) -> String {
        format!("socks5h://{}:{}", self.host, self.port)
    }
}

/// External tunnel collaborator as seen by the core.
#[async_trait]
pub trait Tunnel: Send + Sync {
    fn endpoint(&self) -> Option<TunnelEndpoint>;

    async fn is_ready(&self) -> bool;
}

/// A tunnel assumed to be already running at a fixed local endpoint.
pub struct StaticTunnel {
    endpoint: TunnelEndpoint,
    check_url: String,
    check_timeout: Duration,
}

impl StaticTunnel {
    #[must_use]
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            endpoint: TunnelEndpoint::from_config(config),
            check_url: config.check_url.clone(),
            check_timeout: Duration::from_secs(u64::from(config.check_timeout_seconds)),
        }
    }
}

#[async_trait]
impl Tunnel for StaticTunnel {
    fn endpoint(&self) -> Option<TunnelEndpoint> {
        Some(self.endpoint.clone())
    }

    /// One bounded round-trip through the proxy against the check URL.
    async fn is_ready(&self) -> bool {
        let Ok(proxy) = reqwest::Proxy::all(self.endpoint.socks_url()) else {
            return false;
        };

        let Ok(client) = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(self.check_timeout)
            .build()
        else {
            return false;
        };

        match client.get(&self.check_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Tunnel readiness check failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socks_url_format() {
        let endpoint = TunnelEndpoint {
            host: "127.0.0.1".to_string(),
            port: 9050,
        };
        assert_eq!(endpoint.socks_url(), "socks5h://127.0.0.1:9050");
    }

    #[test]
    fn test_endpoint_from_config() {
        let endpoint = TunnelEndpoint::from_config(&ProxyConfig::default());
        assert_eq!(endpoint.port, 9050);
    }
}
