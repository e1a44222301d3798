// Local filesystem storage for mirrored resources

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use webmirror_scanner::Sink;

const INDEX_DOCUMENT: &str = "index.html";
const MAX_TITLE_LEN: usize = 120;
const MOVED_DIR_SUFFIX: &str = ".d";

/// Writes resources under `<root>/<host>/<path>`.
///
/// Documents get a directory of their own named after their path and are
/// stored inside it as `<title>.html`, so sibling pages never collide with
/// the files they link to.
pub struct LocalSink {
    root: PathBuf,
}

impl LocalSink {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "mirror directory cannot be empty",
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a resource on disk, without the document file name.
    pub fn resource_path(&self, url: &Url) -> PathBuf {
        let host = url
            .host_str()
            .map(sanitize_component)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown-host".to_string());

        let mut path = self.root.join(host);
        if let Some(segments) = url.path_segments() {
            for segment in segments {
                if segment.is_empty() || segment == "." || segment == ".." {
                    continue;
                }
                let segment = sanitize_component(segment);
                if !segment.is_empty() {
                    path.push(segment);
                }
            }
        }
        path
    }

    pub fn document_path(&self, url: &Url, markup: &[u8]) -> PathBuf {
        let name = document_title(markup)
            .map(|title| sanitize_component(&title))
            .filter(|title| !title.is_empty())
            .map(|title| format!("{}.html", title))
            .unwrap_or_else(|| INDEX_DOCUMENT.to_string());

        self.resource_path(url).join(name)
    }

    pub fn file_path(&self, url: &Url) -> PathBuf {
        let path = self.resource_path(url);
        if url.path().ends_with('/') {
            path.join("index")
        } else {
            path
        }
    }

    /// Steers `path` around names already taken on disk.
    ///
    /// A parent component that exists as a file is replaced by `<name>.d`,
    /// and a final name already taken by a directory becomes `<stem>-N.<ext>`.
    /// The same URL always lands in the same place once the tree is settled.
    pub async fn free_path(&self, path: &Path) -> PathBuf {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return path.to_path_buf();
        };
        let components: Vec<&OsStr> = relative.iter().collect();
        let Some((last, parents)) = components.split_last() else {
            return path.to_path_buf();
        };

        let mut current = self.root.clone();
        for component in parents {
            let mut name = component.to_os_string();
            while is_file(&current.join(&name)).await {
                name.push(MOVED_DIR_SUFFIX);
            }
            current.push(name);
        }

        let mut candidate = current.join(last);
        let mut n = 1;
        while is_dir(&candidate).await {
            candidate = current.join(numbered(last, n));
            n += 1;
        }
        candidate
    }

    async fn write(&self, path: PathBuf, bytes: &[u8]) -> io::Result<()> {
        let free = self.free_path(&path).await;
        if free != path {
            debug!("{} is taken, writing to {}", path.display(), free.display());
        }

        if let Some(parent) = free.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&free, bytes).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), free.display());
        Ok(())
    }
}

#[async_trait]
impl Sink for LocalSink {
    async fn persist_document(&self, url: &Url, markup: &[u8]) -> io::Result<()> {
        let path = self.document_path(url, markup);
        self.write(path, markup).await
    }

    async fn persist_file(&self, url: &Url, body: &[u8]) -> io::Result<()> {
        let path = self.file_path(url);
        self.write(path, body).await
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| !meta.is_dir())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_dir())
}

/// `Home.html` -> `Home-2.html`, `index` -> `index-2`
fn numbered(name: &OsStr, n: usize) -> OsString {
    let name = Path::new(name);
    let mut numbered = name
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    numbered.push(format!("-{}", n));
    if let Some(ext) = name.extension() {
        numbered.push(".");
        numbered.push(ext);
    }
    numbered
}

/// Text of the first `<title>` element, whitespace collapsed.
pub fn document_title(markup: &[u8]) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let html = String::from_utf8_lossy(markup);
    let document = Html::parse_document(&html);

    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");

    if title.is_empty() {
        None
    } else {
        Some(title.chars().take(MAX_TITLE_LEN).collect())
    }
}

/// Drops characters that are not valid in a file name on common platforms.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();

    match cleaned.trim_end_matches(['.', ' ']) {
        "" => String::new(),
        trimmed => trimmed.to_string(),
    }
}
