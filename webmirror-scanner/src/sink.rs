use async_trait::async_trait;
use std::io;
use url::Url;

/// Durable storage for fetched resources.
///
/// The crawler calls each method at most once per distinct address in a
/// session. Any error returned here ends the session.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stores an HTML document exactly as it was served.
    async fn persist_document(&self, url: &Url, markup: &[u8]) -> io::Result<()>;

    /// Stores a non-HTML resource.
    async fn persist_file(&self, url: &Url, body: &[u8]) -> io::Result<()>;
}
