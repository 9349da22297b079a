// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    handle_crawl, init_tracing, load_urls_from_file, load_urls_from_source, output_path_for,
    parse_url_line, resolve_output_path,
};

// Re-export crawl functionality from linkmap-core
pub use linkmap_core::crawl::{CrawlOptions, CrawlSummary, execute_crawl, extract_url_path};
