use crate::storage::LocalSink;
use indicatif::{ProgressBar, ProgressStyle};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;
use webmirror_scanner::{
    CancellationToken, CrawlSummary, Crawler, ExtensionAllowList, HtmlLinkExtractor, HttpFetcher,
    MirroredResource, ScanError, Scope,
};

/// Options for configuring a mirror operation
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub url: String,
    pub output_dir: PathBuf,
    pub max_depth: usize,
    pub scope: Scope,
    /// Comma-separated suffixes accepted for non-HTML resources
    pub extensions: String,
    pub workers: usize,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl MirrorOptions {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
            max_depth: 1,
            scope: Scope::SameHost,
            extensions: "png,jpg".to_string(),
            workers: 1,
            timeout_secs: 10,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting mirror progress
pub type MirrorProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for reporting each resource as soon as it is saved
pub type MirrorResultCallback = Arc<dyn Fn(MirroredResource) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Wires the default fetcher, link extractor and local sink into a crawler.
pub fn build_crawler(options: &MirrorOptions) -> Result<Crawler, ScanError> {
    let workers = NonZeroUsize::new(options.workers)
        .ok_or_else(|| ScanError::InvalidConfig("workers must be at least 1".to_string()))?;
    let sink = LocalSink::new(&options.output_dir)
        .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
    let fetcher = HttpFetcher::with_timeout(options.timeout_secs)?;
    let extractor = HtmlLinkExtractor::new()?;

    let crawler = Crawler::new(
        &options.url,
        Arc::new(fetcher),
        Arc::new(extractor),
        Arc::new(sink),
    )?
    .with_max_depth(options.max_depth)
    .with_scope(Arc::new(options.scope))
    .with_extensions(Arc::new(ExtensionAllowList::parse(&options.extensions)))
    .with_workers(workers);

    Ok(crawler)
}

/// Execute a mirror with the given options
/// Returns the session summary, or `ScanError::Cancelled` if `cancel` fired
pub async fn execute_mirror(
    options: MirrorOptions,
    cancel: CancellationToken,
    progress_callback: Option<MirrorProgressCallback>,
    result_callback: Option<MirrorResultCallback>,
) -> Result<CrawlSummary, ScanError> {
    let crawler = build_crawler(&options)?;

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Mirroring {} into {}",
            crawler.seed(),
            options.output_dir.display()
        ));
    }

    // Set up single progress bar for overall progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting mirror...");
        Some(Arc::new(pb))
    } else {
        None
    };

    // Counter for resources handed to the sink
    let saved_count = Arc::new(AtomicUsize::new(0));

    let mut crawler = crawler;
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        let count_clone = saved_count.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |depth: usize, url: String| {
            let saved = count_clone.load(Ordering::Relaxed);
            pb_clone.set_message(format!(
                "Mirroring... {} saved [depth {}] {}",
                saved,
                depth,
                extract_url_path(&url)
            ));
        }));
    }

    let count_clone = saved_count.clone();
    let user_callback = result_callback.clone();
    crawler = crawler.with_result_callback(Arc::new(move |resource: MirroredResource| {
        count_clone.fetch_add(1, Ordering::Relaxed);
        if let Some(ref cb) = user_callback {
            cb(resource);
        }
    }));

    let result = crawler.crawl(cancel).await;

    // Finish progress bar (only if enabled)
    if let Some(ref pb) = progress_bar {
        let total = saved_count.load(Ordering::Relaxed);
        match &result {
            Ok(_) => pb.finish_with_message(format!("Mirror complete! {} resources saved", total)),
            Err(ScanError::Cancelled) => {
                pb.finish_with_message(format!("Mirror cancelled after {} resources", total))
            }
            Err(_) => pb.finish_and_clear(),
        }
    }

    if let (Some(callback), Err(e)) = (&progress_callback, &result)
        && !e.is_cancelled()
    {
        callback(format!("[!]  Failed to mirror {}: {}", options.url, e));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount(server: &MockServer, route: &str, content_type: &str, body: &[u8]) {
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", content_type))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", content_type)
                    .set_body_bytes(body.to_vec()),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_extract_url_path() {
        assert_eq!(extract_url_path("https://example.com"), "/");
        assert_eq!(extract_url_path("https://example.com/a/b?c=d"), "/a/b");
        assert_eq!(extract_url_path("not a url"), "not a url");
    }

    #[test]
    fn test_build_crawler_rejects_zero_workers() {
        let dir = TempDir::new().unwrap();
        let mut options = MirrorOptions::new("https://example.com", dir.path());
        options.workers = 0;

        assert!(matches!(
            build_crawler(&options),
            Err(ScanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_crawler_rejects_empty_seed() {
        let dir = TempDir::new().unwrap();
        let options = MirrorOptions::new("", dir.path());

        assert!(matches!(
            build_crawler(&options),
            Err(ScanError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_mirror_writes_site_to_disk() {
        let mock_server = MockServer::start().await;
        let root = r#"<html><head><title>Home</title></head><body>
            <a href="/about/">About</a>
            <img src="/img/logo.png">
            <img src="/img/photo.gif">
        </body></html>"#;
        mount(&mock_server, "/", "text/html; charset=utf-8", root.as_bytes()).await;
        mount(
            &mock_server,
            "/about/",
            "text/html",
            b"<html><head><title>About us</title></head></html>",
        )
        .await;
        mount(&mock_server, "/img/logo.png", "image/png", b"PNG").await;
        mount(&mock_server, "/img/photo.gif", "image/gif", b"GIF").await;

        let dir = TempDir::new().unwrap();
        let options = MirrorOptions::new(mock_server.uri(), dir.path());

        let saved = Arc::new(Mutex::new(Vec::new()));
        let saved_clone = saved.clone();
        let summary = execute_mirror(
            options,
            CancellationToken::new(),
            None,
            Some(Arc::new(move |resource: MirroredResource| {
                saved_clone.lock().unwrap().push(resource.url);
            })),
        )
        .await
        .unwrap();

        let host = dir.path().join("127.0.0.1");
        assert!(host.join("Home.html").exists());
        assert!(host.join("about").join("About us.html").exists());
        assert!(host.join("img").join("logo.png").exists());
        assert!(!host.join("img").join("photo.gif").exists());

        assert_eq!(summary.documents(), 2);
        assert_eq!(summary.files(), 1);
        assert_eq!(saved.lock().unwrap().len(), 3);
    }
}
