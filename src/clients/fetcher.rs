use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::proxy::TunnelEndpoint;

/// Raw outcome of one page fetch.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// HTTP fetch capability used by the crawler and the search engine.
/// Behind a trait so tests can script page graphs without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Whether a tunnel endpoint was supplied; callers bail out early (with
    /// an empty result, not an error) when it wasn't.
    fn is_configured(&self) -> bool;

    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Fetcher that routes every request through the configured SOCKS tunnel.
pub struct ProxiedClient {
    client: Option<Client>,
}

impl ProxiedClient {
    /// Builds a client bound to `endpoint`, or an unconfigured client when
    /// no endpoint is available.
    pub fn new(
        endpoint: Option<TunnelEndpoint>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let Some(endpoint) = endpoint else {
            return Ok(Self { client: None });
        };

        let proxy = reqwest::Proxy::all(endpoint.socks_url())
            .map_err(|e| anyhow::anyhow!("Invalid proxy endpoint: {e}"))?;

        let client = Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client: Some(client),
        })
    }
}

#[async_trait]
impl PageFetcher for ProxiedClient {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No proxy configured"))?;

        let response = client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            anyhow::bail!("GET {url} returned {status}");
        }

        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
