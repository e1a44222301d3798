use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    File,
}

impl ResourceKind {
    pub fn from_media_type(media_type: Option<&str>) -> Self {
        match media_type {
            Some(mt) if mt.eq_ignore_ascii_case("text/html") => ResourceKind::Document,
            _ => ResourceKind::File,
        }
    }
}

/// A resource that was fetched and handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirroredResource {
    pub url: String,
    pub kind: ResourceKind,
    pub depth: usize,
    pub bytes: usize,
    pub links_found: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rejection {
    Scope,
    Extension,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedResource {
    pub url: String,
    pub reason: Rejection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLink {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub max_depth: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub visited: usize,
    pub resources: Vec<MirroredResource>,
    pub dead_links: Vec<DeadLink>,
    pub rejected: Vec<RejectedResource>,
}

impl CrawlSummary {
    pub fn new(seed: String, max_depth: usize) -> Self {
        Self {
            seed,
            max_depth,
            started_at: Utc::now(),
            elapsed: Duration::from_secs(0),
            visited: 0,
            resources: Vec::new(),
            dead_links: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn documents(&self) -> usize {
        self.count_kind(ResourceKind::Document)
    }

    pub fn files(&self) -> usize {
        self.count_kind(ResourceKind::File)
    }

    pub fn total_bytes(&self) -> usize {
        self.resources.iter().map(|r| r.bytes).sum()
    }

    fn count_kind(&self, kind: ResourceKind) -> usize {
        self.resources.iter().filter(|r| r.kind == kind).count()
    }
}
