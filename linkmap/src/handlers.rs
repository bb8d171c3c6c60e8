use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use linkmap_core::crawl::{CrawlOptions, CrawlOutcome, CrawlProgressCallback, execute_crawl};
use linkmap_core::render::{OutputFormat, RenderOutcome, Renderer};
use linkmap_core::report::{ReportFormat, gather_report_data, generate_report, save_report};
use linkmap_scanner::{HrefPolicy, Limits};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CRAWL_FAILURE: i32 = 1;
pub const EXIT_RENDER_FAILURE: i32 = 2;

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url: String,
    pub limits: Limits,
    pub timeout: Duration,
    pub href_policy: HrefPolicy,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub renderer: String,
    pub report: Option<(PathBuf, ReportFormat)>,
    pub quiet: bool,
}

/// What a successful run produced.
pub struct RunReport {
    pub outcome: CrawlOutcome,
    pub render: RenderOutcome,
    /// Set only when the report file was actually written.
    pub report_written: Option<PathBuf>,
}

/// Why a run failed. Crawl and render failures map to distinct exit codes.
#[derive(Debug)]
pub enum RunFailure {
    Crawl(anyhow::Error),
    Render(anyhow::Error),
}

impl RunFailure {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunFailure::Crawl(_) => EXIT_CRAWL_FAILURE,
            RunFailure::Render(_) => EXIT_RENDER_FAILURE,
        }
    }

    pub fn error(&self) -> &anyhow::Error {
        match self {
            RunFailure::Crawl(e) | RunFailure::Render(e) => e,
        }
    }
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Try to parse as-is
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

/// Expand a leading `~` in a user supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Explicit `--format` wins, then the output extension, then SVG.
pub fn pick_format(explicit: Option<&str>, output: &Path) -> OutputFormat {
    explicit
        .and_then(OutputFormat::from_str)
        .or_else(|| OutputFormat::from_path(output))
        .unwrap_or(OutputFormat::Svg)
}

pub fn parse_run_config(args: &ArgMatches) -> anyhow::Result<RunConfig> {
    let raw_url = args
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let url =
        parse_url_line(raw_url).ok_or_else(|| anyhow!("'{}' is not a valid URL", raw_url))?;

    let max_depth = *args.get_one::<usize>("depth").unwrap_or(&4);
    let max_nodes = *args.get_one::<usize>("nodes").unwrap_or(&32);
    let timeout_ms = *args.get_one::<u64>("timeout").unwrap_or(&7500);

    let output = expand_path(
        args.get_one::<String>("output")
            .map(|s| s.as_str())
            .unwrap_or("out.svg"),
    );
    let format = pick_format(
        args.get_one::<String>("format").map(|s| s.as_str()),
        &output,
    );

    let href_policy = if args.get_flag("skip-invalid-links") {
        HrefPolicy::Skip
    } else {
        HrefPolicy::Strict
    };

    let report = match args.get_one::<PathBuf>("report") {
        Some(path) => {
            let raw_format = args
                .get_one::<String>("report-format")
                .map(|s| s.as_str())
                .unwrap_or("text");
            let format = ReportFormat::from_str(raw_format)
                .ok_or_else(|| anyhow!("unknown report format '{}'", raw_format))?;
            Some((expand_path(&path.to_string_lossy()), format))
        }
        None => None,
    };

    Ok(RunConfig {
        url,
        limits: Limits {
            max_depth,
            max_nodes,
        },
        timeout: Duration::from_millis(timeout_ms),
        href_policy,
        output,
        format,
        renderer: args
            .get_one::<String>("renderer")
            .cloned()
            .unwrap_or_else(|| "dot".to_string()),
        report,
        quiet: args.get_flag("quiet"),
    })
}

/// Prints each admitted page to stdout, the way the crawl log has always looked.
pub fn page_printer(quiet: bool) -> Option<CrawlProgressCallback> {
    if quiet {
        return None;
    }
    Some(Arc::new(|line: String| println!("{}", line)))
}

/// Saves the configured report. Returns the path only if it was written;
/// a report that cannot be written does not invalidate the crawl.
pub fn write_report(config: &RunConfig, outcome: &CrawlOutcome) -> Option<PathBuf> {
    let (path, format) = config.report.as_ref()?;
    let data = gather_report_data(outcome);

    let content = match generate_report(&data, *format) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not generate report: {}", e);
            return None;
        }
    };

    match save_report(&content, path) {
        Ok(()) => Some(path.clone()),
        Err(e) => {
            warn!("Could not save report to {}: {}", path.display(), e);
            None
        }
    }
}

/// Crawl, optionally save a report, then render the graph.
pub async fn run(
    config: &RunConfig,
    cancel_flag: Option<Arc<AtomicBool>>,
) -> Result<RunReport, RunFailure> {
    let options = CrawlOptions {
        url: config.url.clone(),
        limits: config.limits,
        timeout: config.timeout,
        href_policy: config.href_policy,
        show_progress_bars: !config.quiet,
        cancel_flag,
    };

    let outcome = execute_crawl(options, page_printer(config.quiet))
        .await
        .with_context(|| format!("crawl of {} failed", config.url))
        .map_err(RunFailure::Crawl)?;

    let report_written = write_report(config, &outcome);

    if !config.quiet {
        println!("generating image...");
    }

    let renderer = Renderer::new(&config.output, config.format).with_program(&config.renderer);
    let render = renderer
        .render(&outcome.graph.serialize())
        .await
        .with_context(|| format!("could not render {}", config.output.display()))
        .map_err(RunFailure::Render)?;

    if !config.quiet && !render.stdout.trim().is_empty() {
        println!("{}", render.stdout.trim_end());
    }

    Ok(RunReport {
        outcome,
        render,
        report_written,
    })
}

pub fn print_summary(report: &RunReport) {
    let outcome = &report.outcome;
    println!(
        "{} {} pages, {} links in {:.2?}",
        "✓".green().bold(),
        outcome.graph.node_count().to_string().bright_white(),
        outcome.graph.edge_count().to_string().bright_white(),
        outcome.elapsed
    );
    println!(
        "{} Graph written to {}",
        "→".blue(),
        report.render.output.display().to_string().bright_white()
    );
    if let Some(ref path) = report.report_written {
        println!(
            "{} Report written to {}",
            "→".blue(),
            path.display().to_string().bright_white()
        );
    }
}

pub fn print_failure(failure: &RunFailure) {
    let label = match failure {
        RunFailure::Crawl(_) => "Crawl failed",
        RunFailure::Render(_) => "Rendering failed",
    };
    eprintln!("{} {}: {:#}", "✗".red().bold(), label, failure.error());
}
