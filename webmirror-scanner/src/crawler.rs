use crate::error::{Result, ScanError};
use crate::fetch::{Fetcher, until_cancelled};
use crate::links::LinkExtractor;
use crate::policy::{ExtensionAllowList, ExtensionPolicy, Scope, ScopePolicy};
use crate::result::{
    CrawlSummary, DeadLink, MirroredResource, RejectedResource, Rejection, ResourceKind,
};
use crate::session::Session;
use crate::sink::Sink;
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Called with `(depth, url)` when a visit starts.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Called once for every resource handed to the sink.
pub type ResultCallback = Arc<dyn Fn(MirroredResource) + Send + Sync>;

/// How a single visit ended.
enum Visit {
    Mirrored {
        resource: MirroredResource,
        children: Vec<Url>,
    },
    Dead {
        url: Url,
        error: ScanError,
    },
    Rejected {
        url: Url,
        reason: Rejection,
    },
}

pub struct Crawler {
    seed: Url,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    sink: Arc<dyn Sink>,
    scope: Arc<dyn ScopePolicy>,
    extensions: Arc<dyn ExtensionPolicy>,
    max_depth: usize,
    workers: NonZeroUsize,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Crawler {
    pub fn new(
        seed: &str,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        sink: Arc<dyn Sink>,
    ) -> Result<Self> {
        let seed = seed.trim();
        if seed.is_empty() {
            return Err(ScanError::InvalidUrl("seed address is empty".to_string()));
        }

        let mut seed = Url::parse(seed)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))?;
        if !matches!(seed.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: only http and https can be mirrored",
                seed
            )));
        }
        seed.set_fragment(None);

        Ok(Self {
            seed,
            fetcher,
            extractor,
            sink,
            scope: Arc::new(Scope::default()),
            extensions: Arc::new(ExtensionAllowList::default()),
            max_depth: 1,
            workers: NonZeroUsize::MIN,
            progress_callback: None,
            result_callback: None,
        })
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_scope(mut self, scope: Arc<dyn ScopePolicy>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_extensions(mut self, extensions: Arc<dyn ExtensionPolicy>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Number of visits allowed in flight at once. One keeps the crawl in document order.
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Mirrors everything reachable from the seed.
    ///
    /// Each call runs an independent session with its own visited set.
    /// Returns [`ScanError::Cancelled`] if `cancel` fires before the crawl
    /// finishes; resources already persisted stay where they are.
    pub async fn crawl(&self, cancel: CancellationToken) -> Result<CrawlSummary> {
        info!(
            "Starting mirror of {} (max depth {}, {} workers)",
            self.seed, self.max_depth, self.workers
        );

        let started = Instant::now();
        let mut session = Session::new(&self.seed, self.max_depth);
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < self.workers.get() {
                if cancel.is_cancelled() {
                    info!(
                        "Crawl of {} cancelled after {} addresses",
                        self.seed,
                        session.visited_count()
                    );
                    return Err(ScanError::Cancelled);
                }

                let Some((url, depth)) = session.next_visit() else {
                    break;
                };

                if let Some(ref callback) = self.progress_callback {
                    callback(depth, url.to_string());
                }
                in_flight.push(self.visit(url, depth, &cancel));
            }

            let Some(outcome) = in_flight.next().await else {
                break;
            };

            match outcome {
                Ok(visit) => self.record(&mut session, visit),
                Err(ScanError::Cancelled) => {
                    info!(
                        "Crawl of {} cancelled after {} addresses",
                        self.seed,
                        session.visited_count()
                    );
                    return Err(ScanError::Cancelled);
                }
                Err(e) => {
                    warn!("Aborting crawl of {}: {}", self.seed, e);
                    return Err(e);
                }
            }
        }

        let mut summary = session.into_summary();
        summary.elapsed = started.elapsed();
        info!(
            "Crawl complete. Visited {} addresses, mirrored {} resources",
            summary.visited,
            summary.resources.len()
        );
        Ok(summary)
    }

    fn record(&self, session: &mut Session, visit: Visit) {
        match visit {
            Visit::Mirrored { resource, children } => {
                let depth = resource.depth;
                if let Some(ref callback) = self.result_callback {
                    callback(resource.clone());
                }
                session.summary.resources.push(resource);
                session.push_children(children, depth);
            }
            Visit::Dead { url, error } => {
                warn!("Dead link {}: {}", url, error);
                session.summary.dead_links.push(DeadLink {
                    url: url.to_string(),
                    error: error.to_string(),
                });
            }
            Visit::Rejected { url, reason } => {
                debug!("Rejected {} ({:?})", url, reason);
                session.summary.rejected.push(RejectedResource {
                    url: url.to_string(),
                    reason,
                });
            }
        }
    }

    async fn visit(&self, url: Url, depth: usize, cancel: &CancellationToken) -> Result<Visit> {
        debug!("Visiting {} at depth {}", url, depth);

        let probe = match self.fetcher.probe(&url, cancel).await {
            Ok(probe) => probe,
            Err(e) => return prune(url, e),
        };
        if !probe.is_success() {
            let error = ScanError::Status {
                url: url.to_string(),
                status: probe.status,
            };
            return Ok(Visit::Dead { url, error });
        }

        match ResourceKind::from_media_type(probe.media_type.as_deref()) {
            ResourceKind::Document => self.visit_document(url, depth, cancel).await,
            ResourceKind::File => self.visit_file(url, depth, cancel).await,
        }
    }

    async fn visit_document(
        &self,
        url: Url,
        depth: usize,
        cancel: &CancellationToken,
    ) -> Result<Visit> {
        if !self.scope.is_in_scope(&url, &self.seed) {
            return Ok(Visit::Rejected {
                url,
                reason: Rejection::Scope,
            });
        }

        let body = match self.fetcher.fetch(&url, cancel).await {
            Ok(body) => body,
            Err(e) => return prune(url, e),
        };

        until_cancelled(cancel, self.sink.persist_document(&url, &body))
            .await?
            .map_err(|source| ScanError::Persist {
                url: url.to_string(),
                source,
            })?;

        let children = self
            .extractor
            .extract_links(&body, &url)
            .map_err(|e| match e {
                ScanError::Markup { .. } => e,
                other => ScanError::Markup {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })?;

        Ok(Visit::Mirrored {
            resource: mirrored(&url, ResourceKind::Document, depth, &body, children.len()),
            children,
        })
    }

    async fn visit_file(&self, url: Url, depth: usize, cancel: &CancellationToken) -> Result<Visit> {
        if !self.scope.is_in_scope(&url, &self.seed) {
            return Ok(Visit::Rejected {
                url,
                reason: Rejection::Scope,
            });
        }
        if !self.extensions.is_acceptable(&url) {
            return Ok(Visit::Rejected {
                url,
                reason: Rejection::Extension,
            });
        }

        let body = match self.fetcher.fetch(&url, cancel).await {
            Ok(body) => body,
            Err(e) => return prune(url, e),
        };

        until_cancelled(cancel, self.sink.persist_file(&url, &body))
            .await?
            .map_err(|source| ScanError::Persist {
                url: url.to_string(),
                source,
            })?;

        Ok(Visit::Mirrored {
            resource: mirrored(&url, ResourceKind::File, depth, &body, 0),
            children: Vec::new(),
        })
    }
}

fn prune(url: Url, error: ScanError) -> Result<Visit> {
    if error.is_dead_link() {
        Ok(Visit::Dead { url, error })
    } else {
        Err(error)
    }
}

fn mirrored(
    url: &Url,
    kind: ResourceKind,
    depth: usize,
    body: &Bytes,
    links_found: usize,
) -> MirroredResource {
    MirroredResource {
        url: url.to_string(),
        kind,
        depth,
        bytes: body.len(),
        links_found,
    }
}
