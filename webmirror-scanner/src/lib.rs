pub mod crawler;
pub mod error;
pub mod fetch;
pub mod links;
pub mod policy;
pub mod result;
mod session;
pub mod sink;

pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::ScanError;
pub use fetch::{Fetcher, HttpFetcher, Probe};
pub use links::{HtmlLinkExtractor, LinkExtractor};
pub use policy::{ExtensionAllowList, ExtensionPolicy, Scope, ScopePolicy};
pub use result::{CrawlSummary, MirroredResource, ResourceKind};
pub use sink::Sink;
pub use tokio_util::sync::CancellationToken;
