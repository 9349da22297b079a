pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod graph;
pub mod location;
pub mod result;

pub use crawler::{Crawler, ProgressCallback, ResultCallback, crawl};
pub use error::{CrawlError, FetchError};
pub use fetch::{Document, Fetcher, HttpFetcher};
pub use graph::{FailedFetchPolicy, LinkGraph};
pub use location::Location;
pub use result::{CrawlOutcome, CrawlStats, PageResult};
