use crate::error::Result;
use crate::graph::{Attributes, LinkGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_MAX_NODES: usize = 32;

/// Admission limits, fixed for the duration of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Deepest link distance from the seed that is still visited. The seed is depth 0.
    pub max_depth: usize,
    /// Total pages admitted into the graph.
    pub max_nodes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Counters describing how a crawl went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub pages_visited: usize,
    pub soft_stops: usize,
    pub gated_by_nodes: usize,
    pub gated_by_depth: usize,
    pub already_visited: usize,
    pub skipped_links: usize,
    pub edges_added: usize,
    pub edges_dropped: usize,
}

/// Admission outcome for a candidate URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    NodeLimit,
    DepthLimit,
    AlreadyVisited,
}

/// State owned by a single crawl run.
///
/// The visited set and node counter only ever grow. Nothing here outlives
/// the `crawl` call that created it, apart from the graph handed back.
pub struct CrawlSession {
    limits: Limits,
    visited: HashSet<String>,
    node_count: usize,
    graph: LinkGraph,
    stats: CrawlStats,
}

impl CrawlSession {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            visited: HashSet::new(),
            node_count: 0,
            graph: LinkGraph::new(),
            stats: CrawlStats::default(),
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Gating checks in order: node budget, depth, then dedup.
    pub fn check(&mut self, url: &str, depth: usize) -> Admission {
        let admission = if self.node_count >= self.limits.max_nodes {
            self.stats.gated_by_nodes += 1;
            Admission::NodeLimit
        } else if depth > self.limits.max_depth {
            self.stats.gated_by_depth += 1;
            Admission::DepthLimit
        } else if self.visited.contains(url) {
            self.stats.already_visited += 1;
            Admission::AlreadyVisited
        } else {
            Admission::Admitted
        };

        if admission != Admission::Admitted {
            debug!("Not visiting {} at depth {}: {:?}", url, depth, admission);
        }
        admission
    }

    /// Marks `url` visited and registers it as a node. Returns the page's
    /// ordinal (1-based).
    pub fn admit(&mut self, url: &str) -> Result<usize> {
        self.node_count += 1;
        self.visited.insert(url.to_string());
        self.graph.add_node(url, Attributes::new())?;
        self.stats.pages_visited += 1;
        Ok(self.node_count)
    }

    pub fn record_soft_stop(&mut self) {
        self.stats.soft_stops += 1;
    }

    pub fn record_skipped_link(&mut self) {
        self.stats.skipped_links += 1;
    }

    /// Adds the `from -> to` edge, keeping count of what the graph declined.
    pub fn link(&mut self, from: &str, to: &str) {
        if self.graph.add_edge(from, to) {
            self.stats.edges_added += 1;
        } else if !self.graph.has_node(from) {
            self.stats.edges_dropped += 1;
        }
    }

    pub fn finish(self) -> (LinkGraph, CrawlStats) {
        (self.graph, self.stats)
    }
}
