use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    command!()
        .name("linkmap")
        .bin_name("linkmap")
        .about("Crawl a website and draw the graph of links between its pages")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress per-page output and progress").required(false))
        .arg(
            arg!(-v --"verbose" ... "Increase log verbosity (-v info, -vv debug)")
                .required(false),
        )
        .arg(
            arg!(-u --"url" <URL>)
                .required(false)
                .help("The URL to analyse")
                .default_value("https://golang.org"),
        )
        .arg(
            arg!(-d --"depth" <DEPTH>)
                .required(false)
                .help("The maximum depth to go into the tree")
                .value_parser(clap::value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            arg!(-n --"nodes" <NODES>)
                .required(false)
                .help("The maximum amount of nodes to generate")
                .value_parser(clap::value_parser!(usize))
                .default_value("32"),
        )
        .arg(
            arg!(-t --"timeout" <MILLIS>)
                .required(false)
                .help("The timeout on each GET request, in milliseconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("7500"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Where to write the rendered graph")
                .default_value("out.svg"),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Image format (default: from the output extension, else svg)")
                .value_parser(["svg", "png", "pdf", "dot"]),
        )
        .arg(
            arg!(--"renderer" <PROGRAM>)
                .required(false)
                .help("Graphviz-compatible program used to draw the graph")
                .default_value("dot"),
        )
        .arg(
            arg!(--"skip-invalid-links")
                .required(false)
                .help("Warn about and skip links that cannot be resolved instead of failing")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-r --"report" <PATH>)
                .required(false)
                .help("Also save a crawl report to this file")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(--"report-format" <FORMAT>)
                .required(false)
                .help("Report format: text, json, markdown")
                .value_parser(["text", "json", "markdown"])
                .default_value("text"),
        )
}
