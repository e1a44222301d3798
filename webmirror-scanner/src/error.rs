use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to extract links from {url}: {reason}")]
    Markup { url: String, reason: String },

    #[error("Failed to persist {url}: {source}")]
    Persist {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// A dead link prunes one branch of the crawl; anything else ends the session.
    pub fn is_dead_link(&self) -> bool {
        matches!(self, ScanError::HttpError(_) | ScanError::Status { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_dead_link() {
        let err = ScanError::Status {
            url: "http://example.com/missing".to_string(),
            status: 404,
        };
        assert!(err.is_dead_link());
        assert!(!err.is_cancelled());
        assert_eq!(
            err.to_string(),
            "http://example.com/missing responded with status 404"
        );
    }

    #[test]
    fn test_persist_is_fatal() {
        let err = ScanError::Persist {
            url: "http://example.com/".to_string(),
            source: std::io::Error::other("disk full"),
        };
        assert!(!err.is_dead_link());
        assert!(err.to_string().contains("http://example.com/"));
    }

    #[test]
    fn test_cancelled() {
        assert!(ScanError::Cancelled.is_cancelled());
        assert!(!ScanError::Cancelled.is_dead_link());
    }
}
