// Report generation from a finished crawl

use crate::crawl::{CrawlOutcome, extract_url_path};
use linkmap_scanner::graph::GraphExport;
use linkmap_scanner::{CrawlStats, Limits};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub seed: String,
    pub limits: Limits,
    pub elapsed_ms: u64,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub stats: CrawlStats,
    /// Page paths grouped by host, hosts sorted, paths in visit order.
    pub pages_by_host: BTreeMap<String, Vec<String>>,
    pub graph: GraphExport,
}

pub fn gather_report_data(outcome: &CrawlOutcome) -> ReportData {
    let mut pages_by_host: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for page in outcome.graph.nodes() {
        let host = Url::parse(&page.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| "unknown".to_string());
        pages_by_host
            .entry(host)
            .or_default()
            .push(extract_url_path(&page.url));
    }

    ReportData {
        seed: outcome.seed.clone(),
        limits: outcome.limits,
        elapsed_ms: outcome.elapsed.as_millis() as u64,
        total_nodes: outcome.graph.node_count(),
        total_edges: outcome.graph.edge_count(),
        stats: outcome.stats.clone(),
        pages_by_host,
        graph: outcome.graph.export(),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                  LINKMAP CRAWL REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Seed:         {}\n", data.seed));
    report.push_str(&format!(
        "Limits:       depth {}, nodes {}\n",
        data.limits.max_depth, data.limits.max_nodes
    ));
    report.push_str(&format!("Duration:     {} ms\n", data.elapsed_ms));
    report.push_str(&format!("Pages:        {}\n", data.total_nodes));
    report.push_str(&format!("Links:        {}\n", data.total_edges));
    report.push('\n');

    report.push_str("# Summary:\n");
    report.push_str(&format!("  Soft stops:          {}\n", data.stats.soft_stops));
    report.push_str(&format!("  Gated by node limit: {}\n", data.stats.gated_by_nodes));
    report.push_str(&format!("  Gated by depth:      {}\n", data.stats.gated_by_depth));
    report.push_str(&format!("  Already visited:     {}\n", data.stats.already_visited));
    report.push_str(&format!("  Links dropped:       {}\n", data.stats.edges_dropped));
    if data.stats.skipped_links > 0 {
        report.push_str(&format!("  Invalid links:       {}\n", data.stats.skipped_links));
    }
    report.push('\n');

    for (host, paths) in &data.pages_by_host {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages found\n\n", paths.len()));
        for path in paths {
            report.push_str(&format!("  {}\n", path));
        }
        report.push('\n');
    }

    report
}

pub fn generate_json_report(data: &ReportData) -> serde_json::Result<String> {
    serde_json::to_string_pretty(data)
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("# Linkmap Crawl Report\n\n");
    report.push_str("| | |\n|---|---|\n");
    report.push_str(&format!("| Seed | `{}` |\n", data.seed));
    report.push_str(&format!("| Max depth | {} |\n", data.limits.max_depth));
    report.push_str(&format!("| Max nodes | {} |\n", data.limits.max_nodes));
    report.push_str(&format!("| Pages | {} |\n", data.total_nodes));
    report.push_str(&format!("| Links | {} |\n", data.total_edges));
    report.push_str(&format!("| Duration | {} ms |\n\n", data.elapsed_ms));

    report.push_str("## Pages\n\n");
    for (host, paths) in &data.pages_by_host {
        report.push_str(&format!("### {}\n\n", host));
        for path in paths {
            report.push_str(&format!("- `{}`\n", path));
        }
        report.push('\n');
    }

    report.push_str("## Links\n\n");
    if data.graph.edges.is_empty() {
        report.push_str("_No links recorded._\n");
    }
    for edge in &data.graph.edges {
        report.push_str(&format!("- `{}` → `{}`\n", edge.to, edge.from));
    }

    report
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn save_report(content: &str, output_path: &Path) -> std::io::Result<()> {
    let mut file = File::create(output_path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
