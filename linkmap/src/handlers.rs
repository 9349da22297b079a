use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use linkmap_core::{
    CrawlOptions, CrawlProgressCallback, CrawlResultCallback, CrawlSummary, ReportFormat,
    execute_crawl, render_report, save_report,
};
use linkmap_scanner::PageResult;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use url::Url;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file. Lines starting with `#` are comments.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{}  Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Expand `~` and environment variables in a user-supplied output path.
pub fn resolve_output_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

/// Resolve the report path and give it the format's extension when it has none.
pub fn output_path_for(raw: &str, format: ReportFormat) -> PathBuf {
    let mut path = resolve_output_path(raw);
    if path.extension().is_none() {
        path.set_extension(format.extension());
    }
    path
}

/// Install the fmt subscriber on stderr so reports on stdout stay clean.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_crawl_header(options: &CrawlOptions) {
    eprintln!(
        "\n{}  Crawling {} seed(s)",
        "🕷".bright_cyan(),
        options.urls.len().to_string().bright_white()
    );
    eprintln!("{} Max depth: {}", "→".blue(), options.max_depth);
    eprintln!("{} Max concurrency: {}", "→".blue(), options.max_concurrency);
    eprintln!("{} Request timeout: {}s", "→".blue(), options.timeout_secs);
    if let Some(secs) = options.crawl_timeout_secs {
        eprintln!("{} Crawl timeout: {}s", "→".blue(), secs);
    }
    let scope = if options.same_host_only {
        "seed host only"
    } else {
        "follow all hosts"
    };
    eprintln!("{} Scope: {}\n", "→".blue(), scope);
}

fn print_crawl_footer(summary: &CrawlSummary) {
    eprintln!(
        "\n{} Crawl complete: {} pages, {} edges, {} failures",
        "✓".green().bold(),
        summary.stats.fetched.to_string().bright_white(),
        summary.stats.edges.to_string().bright_white(),
        summary.stats.failed.to_string().bright_white()
    );
    if summary.stats.timed_out {
        eprintln!(
            "{} Crawl timeout reached, the graph is partial",
            "⚠".yellow().bold()
        );
    }
}

fn crawl_options_from_matches(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<CrawlOptions> {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let urls = load_urls_from_source(url, hosts_file).map_err(|e| anyhow!(e))?;

    let defaults = CrawlOptions::default();
    Ok(CrawlOptions {
        urls,
        max_concurrency: sub_matches
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or(defaults.max_concurrency),
        max_depth: sub_matches
            .get_one::<usize>("depth")
            .copied()
            .unwrap_or(defaults.max_depth),
        timeout_secs: sub_matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(defaults.timeout_secs),
        crawl_timeout_secs: sub_matches.get_one::<u64>("crawl-timeout").copied(),
        same_host_only: sub_matches.get_flag("same-host"),
        keep_failed: sub_matches.get_flag("keep-failed"),
        user_agent: sub_matches.get_one::<String>("user-agent").cloned(),
        show_progress_bars: !quiet,
    })
}

async fn run_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let options = crawl_options_from_matches(sub_matches, quiet)?;

    let format_name = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let format = ReportFormat::from_str(format_name)
        .ok_or_else(|| anyhow!("Unknown report format '{}'", format_name))?;
    let output = sub_matches
        .get_one::<String>("output")
        .map(|raw| output_path_for(raw, format));

    if !quiet {
        print_crawl_header(&options);
    }

    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            eprintln!("{}", msg);
        }))
    };

    let result_callback: Option<CrawlResultCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|page: PageResult| {
            if let Some(ref error) = page.error {
                eprintln!("  {} {}  ({})", "✗".red(), page.url, error.dimmed());
            }
        }))
    };

    let summary = execute_crawl(options, progress_callback, result_callback)
        .await
        .map_err(|e| anyhow!("Crawl failed: {}", e))?;

    if !quiet {
        print_crawl_footer(&summary);
    }

    let report = render_report(format, &summary).context("Failed to render report")?;

    match output {
        Some(path) => {
            save_report(&report, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => print!("{}", report),
    }

    Ok(())
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    init_tracing(sub_matches.get_flag("verbose"));

    if let Err(e) = run_crawl(sub_matches, quiet).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
