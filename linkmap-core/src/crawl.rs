use indicatif::{ProgressBar, ProgressStyle};
use linkmap_scanner::crawler::DEFAULT_TIMEOUT;
use linkmap_scanner::{
    CrawlStats, Crawler, Fetcher, HrefPolicy, Limits, LinkGraph, ProgressCallback, ScanError,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use url::Url;

/// Placeholder seed used when none is given.
pub const DEFAULT_SEED: &str = "https://golang.org";

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub limits: Limits,
    pub timeout: Duration,
    pub href_policy: HrefPolicy,
    pub show_progress_bars: bool,
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_SEED.to_string(),
            limits: Limits::default(),
            timeout: DEFAULT_TIMEOUT,
            href_policy: HrefPolicy::Strict,
            show_progress_bars: false,
            cancel_flag: None,
        }
    }
}

/// Callback for reporting each page as it is admitted, already formatted
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a finished crawl produced.
pub struct CrawlOutcome {
    pub seed: String,
    pub limits: Limits,
    pub graph: LinkGraph,
    pub stats: CrawlStats,
    pub elapsed: Duration,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// One line per admitted page, indented by depth.
pub fn format_page_line(number: usize, depth: usize, url: &str) -> String {
    format!("{}{:>5}: {}", " ".repeat(depth), number, url)
}

/// Execute a crawl over HTTP with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome, ScanError> {
    let crawler = Crawler::http()?;
    execute_crawl_with(crawler, options, progress_callback).await
}

/// Same as [`execute_crawl`] but with a caller-supplied crawler, whose
/// limits, timeout and policy are overwritten from `options`.
pub async fn execute_crawl_with<F: Fetcher>(
    crawler: Crawler<F>,
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome, ScanError> {
    let CrawlOptions {
        url,
        limits,
        timeout,
        href_policy,
        show_progress_bars,
        cancel_flag,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Crawling {}...", url));
        Some(Arc::new(pb))
    } else {
        None
    };

    let pb_clone = progress_bar.clone();
    let page_callback: ProgressCallback = Arc::new(move |number: usize, depth: usize, page: String| {
        let line = format_page_line(number, depth, &page);
        // A hidden bar (stderr not a terminal) swallows its output
        let visible_bar = pb_clone.as_ref().filter(|pb| !pb.is_hidden());

        match (visible_bar, &progress_callback) {
            (Some(pb), Some(callback)) => pb.suspend(|| callback(line)),
            (Some(pb), None) => pb.println(&line),
            (None, Some(callback)) => callback(line),
            (None, None) => {}
        }

        if let Some(ref pb) = pb_clone {
            pb.set_message(format!("Crawling... {} pages", number));
            pb.tick();
        }
    });

    let mut crawler = crawler
        .with_limits(limits)
        .with_timeout(timeout)
        .with_href_policy(href_policy)
        .with_progress_callback(page_callback);

    if let Some(flag) = cancel_flag {
        crawler = crawler.with_cancel_flag(flag);
    }

    let start = Instant::now();
    let result = crawler.crawl_with_stats(&url).await;

    if let Some(ref pb) = progress_bar {
        match &result {
            Ok((graph, _)) => pb.finish_with_message(format!(
                "Crawl complete! {} pages, {} links",
                graph.node_count(),
                graph.edge_count()
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    let (graph, stats) = result?;
    Ok(CrawlOutcome {
        seed: url,
        limits,
        graph,
        stats,
        elapsed: start.elapsed(),
    })
}
