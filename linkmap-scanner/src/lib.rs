pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod graph;
pub mod session;

pub use crawler::{Crawler, HrefPolicy, ProgressCallback};
pub use error::{FetchError, GraphError, ScanError};
pub use fetch::{Fetcher, HttpFetcher};
pub use graph::LinkGraph;
pub use session::{CrawlStats, Limits};
