use linkmap::commands::command_argument_builder;
use linkmap::handlers::*;
use linkmap_core::render::OutputFormat;
use linkmap_core::report::ReportFormat;
use linkmap_scanner::HrefPolicy;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn config_from(args: &[&str]) -> RunConfig {
    let mut argv = vec!["linkmap"];
    argv.extend_from_slice(args);
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap();
    parse_run_config(&matches).unwrap()
}

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    assert_eq!(
        parse_url_line("example.com"),
        Some("http://example.com".to_string())
    );
    assert_eq!(
        parse_url_line("localhost:8080/docs"),
        Some("http://localhost:8080/docs".to_string())
    );
}

#[test]
fn test_parse_url_line_invalid() {
    assert_eq!(parse_url_line("not a valid url!!!"), None);
    assert_eq!(parse_url_line("   "), None);
}

#[test]
fn test_pick_format() {
    assert_eq!(pick_format(Some("png"), Path::new("out.svg")), OutputFormat::Png);
    assert_eq!(pick_format(None, Path::new("graph.pdf")), OutputFormat::Pdf);
    assert_eq!(pick_format(None, Path::new("graph")), OutputFormat::Svg);
}

#[test]
fn test_expand_path_plain() {
    assert_eq!(expand_path("out.svg"), PathBuf::from("out.svg"));
}

#[test]
fn test_default_config() {
    let config = config_from(&[]);

    assert_eq!(config.url, "https://golang.org");
    assert_eq!(config.limits.max_depth, 4);
    assert_eq!(config.limits.max_nodes, 32);
    assert_eq!(config.timeout, Duration::from_millis(7500));
    assert_eq!(config.output, PathBuf::from("out.svg"));
    assert_eq!(config.format, OutputFormat::Svg);
    assert_eq!(config.renderer, "dot");
    assert_eq!(config.href_policy, HrefPolicy::Strict);
    assert!(config.report.is_none());
    assert!(!config.quiet);
}

#[test]
fn test_config_from_flags() {
    let config = config_from(&[
        "-u",
        "example.org/start",
        "-d",
        "2",
        "-n",
        "10",
        "-t",
        "1500",
        "-o",
        "site.png",
        "--skip-invalid-links",
        "-r",
        "report.json",
        "--report-format",
        "json",
        "-q",
    ]);

    assert_eq!(config.url, "http://example.org/start");
    assert_eq!(config.limits.max_depth, 2);
    assert_eq!(config.limits.max_nodes, 10);
    assert_eq!(config.timeout, Duration::from_millis(1500));
    assert_eq!(config.format, OutputFormat::Png);
    assert_eq!(config.href_policy, HrefPolicy::Skip);
    assert_eq!(
        config.report,
        Some((PathBuf::from("report.json"), ReportFormat::Json))
    );
    assert!(config.quiet);
}

#[test]
fn test_invalid_depth_rejected() {
    let result = command_argument_builder().try_get_matches_from(["linkmap", "-d", "deep"]);
    assert!(result.is_err());
}

#[test]
fn test_exit_codes_are_distinct() {
    let crawl = RunFailure::Crawl(anyhow::anyhow!("boom"));
    let render = RunFailure::Render(anyhow::anyhow!("boom"));

    assert_eq!(crawl.exit_code(), EXIT_CRAWL_FAILURE);
    assert_eq!(render.exit_code(), EXIT_RENDER_FAILURE);
    assert_ne!(EXIT_CRAWL_FAILURE, EXIT_RENDER_FAILURE);
    assert_ne!(EXIT_SUCCESS, EXIT_CRAWL_FAILURE);
}

async fn small_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<a href=\"/a\">a</a>".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<a href=\"/\">home</a>".to_vec()))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_run_writes_graph_and_report() {
    let server = small_site().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("web.dot");
    let report = dir.path().join("report.md");

    let config = config_from(&[
        "-u",
        &format!("{}/", server.uri()),
        "-o",
        output.to_str().unwrap(),
        "-r",
        report.to_str().unwrap(),
        "--report-format",
        "markdown",
        "-q",
    ]);
    assert_eq!(config.format, OutputFormat::Dot);

    let Ok(report_run) = run(&config, None).await else {
        panic!("run failed");
    };
    assert_eq!(report_run.outcome.graph.node_count(), 2);
    assert_eq!(report_run.render.output, output);
    assert_eq!(report_run.report_written.as_deref(), Some(report.as_path()));

    let dot = fs::read_to_string(&output).unwrap();
    assert!(dot.starts_with("digraph \"web\" {"));
    assert!(dot.contains("rankdir=\"LR\""));
    assert!(dot.contains("[ dir=back ]"));

    let report = fs::read_to_string(&report).unwrap();
    assert!(report.contains("# Linkmap Crawl Report"));
}

#[tokio::test]
async fn test_run_render_failure_exit_code() {
    let server = small_site().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.svg");

    let config = config_from(&[
        "-u",
        &format!("{}/", server.uri()),
        "-o",
        output.to_str().unwrap(),
        "--renderer",
        "linkmap-no-such-renderer",
        "-q",
    ]);

    let Err(failure) = run(&config, None).await else {
        panic!("rendering with a missing program should fail");
    };
    assert_eq!(failure.exit_code(), EXIT_RENDER_FAILURE);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_run_crawl_failure_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<a href=\"/slow\">s</a>".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.dot");
    let config = config_from(&[
        "-u",
        &format!("{}/", server.uri()),
        "-t",
        "50",
        "-o",
        output.to_str().unwrap(),
        "-q",
    ]);

    let Err(failure) = run(&config, None).await else {
        panic!("a timed out fetch should fail the crawl");
    };
    assert_eq!(failure.exit_code(), EXIT_CRAWL_FAILURE);
    assert!(!output.exists(), "no image after a failed crawl");
}

#[tokio::test]
async fn test_run_unwritable_report_is_not_claimed() {
    let server = small_site().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("web.dot");
    let report = dir.path().join("missing").join("report.txt");

    let config = config_from(&[
        "-u",
        &format!("{}/", server.uri()),
        "-o",
        output.to_str().unwrap(),
        "-r",
        report.to_str().unwrap(),
        "-q",
    ]);

    let Ok(report_run) = run(&config, None).await else {
        panic!("an unwritable report must not fail the run");
    };
    assert!(report_run.report_written.is_none());
    assert!(output.exists());
}

#[test]
fn test_write_report_without_report_flag() {
    let config = config_from(&["-q"]);
    let outcome = linkmap_core::crawl::CrawlOutcome {
        seed: config.url.clone(),
        limits: config.limits,
        graph: linkmap_scanner::LinkGraph::new(),
        stats: Default::default(),
        elapsed: Duration::ZERO,
    };
    assert!(write_report(&config, &outcome).is_none());
}

#[test]
fn test_page_printer_follows_quiet_flag() {
    assert!(page_printer(true).is_none());
    assert!(page_printer(false).is_some());
}
