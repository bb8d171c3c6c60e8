use linkmap::commands::command_argument_builder;
use linkmap::handlers::{
    EXIT_CRAWL_FAILURE, EXIT_SUCCESS, parse_run_config, print_failure, print_summary, run,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();

    let level = match matches.get_count("verbose") {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let config = match parse_run_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_CRAWL_FAILURE);
        }
    };

    // Ctrl-C stops the crawl before its next fetch
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let flag = cancel_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::Relaxed);
        }
    });

    match run(&config, Some(cancel_flag)).await {
        Ok(report) => {
            if !config.quiet {
                print_summary(&report);
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Err(failure) => {
            print_failure(&failure);
            std::process::exit(failure.exit_code());
        }
    }
}
