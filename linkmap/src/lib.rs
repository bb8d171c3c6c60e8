pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    EXIT_CRAWL_FAILURE, EXIT_RENDER_FAILURE, EXIT_SUCCESS, RunConfig, RunFailure, RunReport,
    parse_run_config, parse_url_line, run,
};

// Re-export crawl functionality from linkmap-core
pub use linkmap_core::crawl::{CrawlOptions, CrawlOutcome, execute_crawl, extract_url_path};
