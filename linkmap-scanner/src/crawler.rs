use crate::error::{Result, ScanError};
use crate::extract::{extract_hrefs, resolve};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::graph::LinkGraph;
use crate::session::{Admission, CrawlSession, CrawlStats, Limits};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(7500);

/// Called once per admitted page with `(page_number, depth, url)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, String) + Send + Sync>;

/// What to do with an anchor whose `href` cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HrefPolicy {
    /// Abort the whole crawl.
    #[default]
    Strict,
    /// Log a warning and carry on with the next anchor.
    Skip,
}

/// A page whose anchors are still being walked.
struct Frame {
    url: String,
    base: Url,
    depth: usize,
    hrefs: std::vec::IntoIter<String>,
}

pub struct Crawler<F: Fetcher = HttpFetcher> {
    fetcher: F,
    limits: Limits,
    timeout: Duration,
    href_policy: HrefPolicy,
    progress_callback: Option<ProgressCallback>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl Crawler<HttpFetcher> {
    pub fn http() -> Result<Self> {
        let fetcher = HttpFetcher::new().map_err(ScanError::Client)?;
        Ok(Self::new(fetcher))
    }
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            limits: Limits::default(),
            timeout: DEFAULT_TIMEOUT,
            href_policy: HrefPolicy::default(),
            progress_callback: None,
            cancel_flag: None,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.limits.max_depth = depth;
        self
    }

    pub fn with_max_nodes(mut self, nodes: usize) -> Self {
        self.limits.max_nodes = nodes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_href_policy(mut self, policy: HrefPolicy) -> Self {
        self.href_policy = policy;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Checked before every fetch; once set, the crawl stops with `ScanError::Cancelled`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub async fn crawl(&self, seed: &str) -> Result<LinkGraph> {
        let (graph, _) = self.crawl_with_stats(seed).await?;
        Ok(graph)
    }

    /// Depth-first, pre-order crawl from `seed`.
    ///
    /// A child's subtree is finished before the edge from the child back to
    /// its parent is recorded, so links to pages that never got admitted
    /// drop out of the graph.
    pub async fn crawl_with_stats(&self, seed: &str) -> Result<(LinkGraph, CrawlStats)> {
        info!(
            "Starting crawl of {} (max depth {}, max nodes {}, timeout {:?})",
            seed, self.limits.max_depth, self.limits.max_nodes, self.timeout
        );

        Url::parse(seed).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))?;

        let mut session = CrawlSession::new(self.limits);
        let mut stack: Vec<Frame> = Vec::new();

        if let Some(frame) = self.enter(&mut session, seed, 0).await? {
            stack.push(frame);
        }

        while let Some(top) = stack.last_mut() {
            let Some(href) = top.hrefs.next() else {
                let Some(done) = stack.pop() else { break };
                if let Some(parent) = stack.last() {
                    session.link(&done.url, &parent.url);
                }
                continue;
            };

            let target = match resolve(&top.base, &href) {
                Ok(Some(target)) => target,
                Ok(None) => continue,
                Err(e) => match self.href_policy {
                    HrefPolicy::Strict => return Err(e),
                    HrefPolicy::Skip => {
                        warn!("Skipping link on {}: {}", top.url, e);
                        session.record_skipped_link();
                        continue;
                    }
                },
            };

            let depth = top.depth + 1;
            let parent = top.url.clone();

            match self.enter(&mut session, &target, depth).await? {
                Some(child) => stack.push(child),
                None => session.link(&target, &parent),
            }
        }

        let (graph, stats) = session.finish();
        info!(
            "Crawl complete. {} pages, {} links",
            graph.node_count(),
            graph.edge_count()
        );
        Ok((graph, stats))
    }

    /// Gates, registers and fetches one candidate. `None` means the branch
    /// ends here without error.
    async fn enter(
        &self,
        session: &mut CrawlSession,
        url: &str,
        depth: usize,
    ) -> Result<Option<Frame>> {
        if session.check(url, depth) != Admission::Admitted {
            return Ok(None);
        }

        if self.is_cancelled() {
            return Err(ScanError::Cancelled(session.node_count()));
        }

        let base = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        let number = session.admit(url)?;

        debug!("{:>5}: {}{}", number, " ".repeat(depth), url);
        if let Some(ref callback) = self.progress_callback {
            callback(number, depth, url.to_string());
        }

        let hrefs = match self.fetcher.fetch(url, self.timeout).await {
            Ok(body) => extract_hrefs(&body),
            Err(e) if e.is_soft_stop() => {
                info!("Stopping at {}: {}", url, e);
                session.record_soft_stop();
                Vec::new()
            }
            Err(e) => {
                return Err(ScanError::Fetch {
                    url: url.to_string(),
                    source: e,
                });
            }
        };

        Ok(Some(Frame {
            url: url.to_string(),
            base,
            depth,
            hrefs: hrefs.into_iter(),
        }))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
