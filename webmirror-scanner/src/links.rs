use crate::error::{Result, ScanError};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

const LINK_ATTRIBUTES: [&str; 2] = ["href", "src"];

/// Turns raw markup into the absolute addresses it references.
pub trait LinkExtractor: Send + Sync {
    /// Returns every `href`/`src` target in document order, resolved against `base`.
    fn extract_links(&self, markup: &[u8], base: &Url) -> Result<Vec<Url>>;
}

pub struct HtmlLinkExtractor {
    selector: Selector,
}

impl HtmlLinkExtractor {
    pub fn new() -> Result<Self> {
        let selector = Selector::parse("[href], [src]")
            .map_err(|e| ScanError::Other(format!("invalid link selector: {}", e)))?;
        Ok(Self { selector })
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, markup: &[u8], base: &Url) -> Result<Vec<Url>> {
        let html = String::from_utf8_lossy(markup);
        let document = Html::parse_document(&html);

        let mut links = Vec::new();
        for element in document.select(&self.selector) {
            for attr in LINK_ATTRIBUTES {
                if let Some(value) = element.value().attr(attr)
                    && let Some(url) = resolve_url(base, value)
                {
                    links.push(url);
                }
            }
        }

        debug!("Found {} links in {}", links.len(), base);
        Ok(links)
    }
}

/// Resolves `href` against `base`, dropping the fragment.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    // Skip empty, javascript:, mailto:, tel:, data: and in-page anchors
    if href.is_empty()
        || href.starts_with('#')
        || has_scheme(href, "javascript")
        || has_scheme(href, "mailto")
        || has_scheme(href, "tel")
        || has_scheme(href, "data")
    {
        return None;
    }

    let mut url = match base.join(href) {
        Ok(url) => url,
        Err(e) => {
            debug!("Skipping unresolvable link '{}' on {}: {}", href, base, e);
            return None;
        }
    };
    url.set_fragment(None);
    Some(url)
}

fn has_scheme(href: &str, scheme: &str) -> bool {
    href.as_bytes().get(scheme.len()) == Some(&b':')
        && href
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}
