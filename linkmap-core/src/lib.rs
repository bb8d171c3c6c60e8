pub mod crawl;
pub mod render;
pub mod report;

pub use crawl::{CrawlOptions, CrawlOutcome, execute_crawl};
pub use render::{OutputFormat, RenderError, RenderOutcome, Renderer};
