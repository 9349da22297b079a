use crate::graph::LinkGraph;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to one dispatched location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub links_found: usize,
    pub error: Option<String>,
}

impl PageResult {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            depth,
            status_code: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            links_found: 0,
            error: None,
        }
    }

    pub fn with_error(url: String, depth: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, depth)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Counters gathered by the engine over one crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Fetches that returned a document.
    pub fetched: usize,
    /// Fetches that failed.
    pub failed: usize,
    /// Distinct locations discovered, seed included.
    pub discovered: usize,
    /// Distinct edges in the final graph.
    pub edges: usize,
    /// True when a crawl-level timeout cut the frontier short.
    pub timed_out: bool,
}

impl CrawlStats {
    /// Fold the counters of another crawl into these.
    pub fn absorb(&mut self, other: &CrawlStats) {
        self.fetched += other.fetched;
        self.failed += other.failed;
        self.discovered += other.discovered;
        self.edges += other.edges;
        self.timed_out |= other.timed_out;
    }
}

/// The frozen graph plus what it took to build it.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub graph: LinkGraph,
    pub stats: CrawlStats,
}
