pub mod crawl;
pub mod report;

pub use crawl::{
    CrawlOptions, CrawlProgressCallback, CrawlResultCallback, CrawlSummary, crawl_blocking,
    execute_crawl, extract_url_path,
};
pub use report::{ForceGraph, ReportFormat, render_report, save_report};

const BANNER: &str = r#"
  _ _       _
 | (_)_ __ | | ___ __ ___   __ _ _ __
 | | | '_ \| |/ / '_ ` _ \ / _` | '_ \
 | | | | | |   <| | | | | | (_| | |_) |
 |_|_|_| |_|_|\_\_| |_| |_|\__,_| .__/
                                |_|
"#;

pub fn print_banner() {
    eprintln!("{}", BANNER);
    eprintln!("  linkmap v{} - map the link graph of a site\n", env!("CARGO_PKG_VERSION"));
}
