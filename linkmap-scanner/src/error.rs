use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Fetch of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] FetchError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Crawl cancelled after {0} pages")]
    Cancelled(usize),
}

/// Failure of a single page fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server hung up before a complete response arrived.
    #[error("connection closed by server: {0}")]
    Closed(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Closed connections end a branch quietly; everything else fails the crawl.
    pub fn is_soft_stop(&self) -> bool {
        matches!(self, FetchError::Closed(_))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} already exists")]
    DuplicateNode(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
