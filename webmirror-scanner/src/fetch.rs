use crate::error::{Result, ScanError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Metadata reported by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub status: u16,
    /// Content type without parameters, lower-cased (`text/html`)
    pub media_type: Option<String>,
}

impl Probe {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network access used by the crawler. Both calls must return
/// [`ScanError::Cancelled`] when `cancel` fires mid-request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn probe(&self, url: &Url, cancel: &CancellationToken) -> Result<Probe>;

    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<Bytes>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("webmirror/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn probe(&self, url: &Url, cancel: &CancellationToken) -> Result<Probe> {
        debug!("HEAD {}", url);
        let response = until_cancelled(cancel, self.client.head(url.clone()).send()).await??;

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(media_type);

        Ok(Probe {
            status: response.status().as_u16(),
            media_type,
        })
    }

    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<Bytes> {
        debug!("GET {}", url);
        let response = until_cancelled(cancel, self.client.get(url.clone()).send()).await??;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = until_cancelled(cancel, response.bytes()).await??;
        Ok(body)
    }
}

/// Races `fut` against the token.
pub async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ScanError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Strips parameters from a content-type header value.
pub fn media_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}
