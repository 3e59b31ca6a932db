//! Stem audio fetching
//!
//! Stems are referenced either by plain HTTP(S) URL or by `ipfs://` URI.
//! IPFS URIs are rewritten onto the configured HTTP gateway.

use crate::collector::StemPayload;
use crate::error::{Error, Result};
use async_trait::async_trait;
use polyecho_common::config::FetchConfig;
use tracing::debug;

const IPFS_SCHEME: &str = "ipfs://";

/// Retrieves one stem's audio payload
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<StemPayload>;
}

/// Rewrite `ipfs://<cid>[/path]` onto `gateway`; other URLs pass through
pub fn resolve_url(url: &str, gateway: &str) -> String {
    match url.strip_prefix(IPFS_SCHEME) {
        Some(rest) => {
            let gateway = gateway.trim_end_matches('/');
            format!("{}/{}", gateway, rest.trim_start_matches('/'))
        }
        None => url.to_string(),
    }
}

/// reqwest-backed fetcher
pub struct HttpAudioFetcher {
    http_client: reqwest::Client,
    ipfs_gateway: String,
}

impl HttpAudioFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::InvalidState(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            ipfs_gateway: config.ipfs_gateway.clone(),
        })
    }
}

#[async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(&self, url: &str) -> Result<StemPayload> {
        let resolved = resolve_url(url, &self.ipfs_gateway);
        debug!(url = %resolved, "Fetching stem audio");

        let fetch_error = |reason: String| Error::Fetch {
            url: resolved.clone(),
            reason,
        };

        let response = self
            .http_client
            .get(&resolved)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status.as_u16())));
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        debug!(url = %resolved, bytes = payload.len(), "Stem audio fetched");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ipfs_uri() {
        assert_eq!(
            resolve_url("ipfs://bafy123/drums.wav", "https://ipfs.io/ipfs/"),
            "https://ipfs.io/ipfs/bafy123/drums.wav"
        );
        assert_eq!(
            resolve_url("ipfs://bafy123", "https://gw.example/ipfs"),
            "https://gw.example/ipfs/bafy123"
        );
    }

    #[test]
    fn test_http_url_passes_through() {
        let url = "https://cdn.example/stems/bass.wav";
        assert_eq!(resolve_url(url, "https://ipfs.io/ipfs/"), url);
    }

    #[test]
    fn test_client_creation() {
        let fetcher = HttpAudioFetcher::new(&FetchConfig::default());
        assert!(fetcher.is_ok());
    }
}
