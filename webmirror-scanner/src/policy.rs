//! Admission policies consulted by the crawler before a resource is fetched.
//!
//! Both policies are pure predicates over addresses. They hold no per-address
//! state, so a single instance can be shared across every branch of a crawl.

use crate::error::ScanError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Decides whether a candidate address lies inside the crawl relative to its seed.
pub trait ScopePolicy: Send + Sync {
    fn is_in_scope(&self, candidate: &Url, seed: &Url) -> bool;
}

/// Decides whether a non-HTML resource has an acceptable file suffix.
pub trait ExtensionPolicy: Send + Sync {
    fn is_acceptable(&self, url: &Url) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Every address is in scope
    Unrestricted,
    /// Only addresses on the seed's host
    #[default]
    SameHost,
    /// Only addresses at or below the seed's directory on the seed's host
    Descendants,
}

impl ScopePolicy for Scope {
    fn is_in_scope(&self, candidate: &Url, seed: &Url) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::SameHost => same_host(candidate, seed),
            Scope::Descendants => is_descendant(candidate, seed),
        }
    }
}

impl FromStr for Scope {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "unrestricted" => Ok(Scope::Unrestricted),
            "host" | "same-host" => Ok(Scope::SameHost),
            "descendants" | "descendant" => Ok(Scope::Descendants),
            other => Err(ScanError::InvalidConfig(format!(
                "unknown scope '{}', expected one of: all, host, descendants",
                other
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Unrestricted => "all",
            Scope::SameHost => "host",
            Scope::Descendants => "descendants",
        };
        f.write_str(name)
    }
}

fn same_host(candidate: &Url, seed: &Url) -> bool {
    match (candidate.host_str(), seed.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn is_descendant(candidate: &Url, seed: &Url) -> bool {
    if candidate.scheme() != seed.scheme()
        || !same_host(candidate, seed)
        || candidate.port_or_known_default() != seed.port_or_known_default()
    {
        return false;
    }

    // "/docs/guide.html" covers everything under "/docs/"
    let seed_path = seed.path();
    let seed_dir = match seed_path.rfind('/') {
        Some(idx) => &seed_path[..=idx],
        None => "/",
    };

    candidate.path().starts_with(seed_dir)
}

/// Literal suffix allow-list over the last path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionAllowList {
    suffixes: Vec<String>,
}

impl ExtensionAllowList {
    /// Builds the list from a comma-separated string such as `"png,jpg"`.
    pub fn parse(list: &str) -> Self {
        let suffixes = list
            .split(',')
            .map(str::trim)
            .filter(|ext| !ext.is_empty() && *ext != ".")
            .map(|ext| {
                if ext.starts_with('.') {
                    ext.to_string()
                } else {
                    format!(".{}", ext)
                }
            })
            .collect();

        Self { suffixes }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }
}

impl ExtensionPolicy for ExtensionAllowList {
    fn is_acceptable(&self, url: &Url) -> bool {
        let Some(segment) = url.path_segments().and_then(|mut segments| segments.next_back())
        else {
            return false;
        };

        self.suffixes.iter().any(|suffix| segment.ends_with(suffix.as_str()))
    }
}
