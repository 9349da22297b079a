use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkmap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkmap")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log every dispatch and discovered link")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl outward from a seed URL (or a file of seeds) and report the link \
                graph.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The seed URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link distance from the seed to fetch")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(-t --"threads" <MAX_CONCURRENCY>)
                        .required(false)
                        .help("Maximum number of fetches in flight at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"crawl-timeout" <SECONDS>)
                        .required(false)
                        .help("Stop dispatching after this many seconds and report a partial graph")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"same-host")
                        .required(false)
                        .help("Only follow links on the seed's host (edges to other hosts are still recorded)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"keep-failed")
                        .required(false)
                        .help("Keep locations whose fetch failed as keys with no outbound links")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-A --"user-agent" <AGENT>)
                        .required(false)
                        .help("User-Agent header sent with every request"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file; the format's extension is added when missing (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, graph, markdown")
                        .value_parser(["text", "json", "graph", "markdown"])
                        .default_value("text"),
                ),
        )
}
