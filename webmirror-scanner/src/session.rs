use crate::result::CrawlSummary;
use std::collections::HashSet;
use url::Url;

/// State for a single crawl. Created by `Crawler::crawl` and dropped when it returns.
pub(crate) struct Session {
    max_depth: usize,
    visited: HashSet<Url>,
    pending: Vec<(Url, usize)>,
    pub(crate) summary: CrawlSummary,
}

impl Session {
    pub(crate) fn new(seed: &Url, max_depth: usize) -> Self {
        let mut session = Self {
            max_depth,
            visited: HashSet::new(),
            pending: Vec::new(),
            summary: CrawlSummary::new(seed.to_string(), max_depth),
        };
        session.pending.push((seed.clone(), 0));
        session
    }

    /// Queues links found on a page at `depth`, keeping document order on pop.
    pub(crate) fn push_children(&mut self, children: Vec<Url>, depth: usize) {
        let child_depth = depth + 1;
        if child_depth > self.max_depth {
            return;
        }
        self.pending
            .extend(children.into_iter().rev().map(|url| (url, child_depth)));
    }

    /// Pops the next address that should be visited and marks it visited.
    pub(crate) fn next_visit(&mut self) -> Option<(Url, usize)> {
        while let Some((url, depth)) = self.pending.pop() {
            if self.admit(&url, depth) {
                return Some((url, depth));
            }
        }
        None
    }

    fn admit(&mut self, url: &Url, depth: usize) -> bool {
        if depth > self.max_depth || !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        self.visited.insert(url.clone())
    }

    pub(crate) fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub(crate) fn into_summary(mut self) -> CrawlSummary {
        self.summary.visited = self.visited.len();
        self.summary
    }
}
