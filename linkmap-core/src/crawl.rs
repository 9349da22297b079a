use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use linkmap_scanner::error::CrawlError;
use linkmap_scanner::{
    CrawlStats, Crawler, FailedFetchPolicy, LinkGraph, PageResult, ProgressCallback,
    ResultCallback,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub max_concurrency: usize,
    pub max_depth: usize,
    pub timeout_secs: u64,
    pub crawl_timeout_secs: Option<u64>,
    pub same_host_only: bool,
    pub keep_failed: bool,
    pub user_agent: Option<String>,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            max_concurrency: 10,
            max_depth: 3,
            timeout_secs: 10,
            crawl_timeout_secs: None,
            same_host_only: false,
            keep_failed: false,
            user_agent: None,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for reporting individual page results as they come in
pub type CrawlResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

/// Everything one `execute_crawl` produced, merged across seeds.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub seeds: Vec<String>,
    pub graph: LinkGraph,
    pub stats: CrawlStats,
    pub pages: Vec<PageResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlSummary {
    /// Fetched pages grouped by host, each group sorted by URL.
    pub fn pages_by_host(&self) -> BTreeMap<String, Vec<&PageResult>> {
        let mut by_host: BTreeMap<String, Vec<&PageResult>> = BTreeMap::new();

        for page in &self.pages {
            if let Ok(url) = Url::parse(&page.url)
                && let Some(host) = url.host_str()
            {
                by_host.entry(host.to_string()).or_default().push(page);
            }
        }

        for pages in by_host.values_mut() {
            pages.sort_by(|a, b| a.url.cmp(&b.url));
        }
        by_host
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

fn build_crawler(options: &CrawlOptions) -> Crawler {
    let policy = if options.keep_failed {
        FailedFetchPolicy::KeepEmpty
    } else {
        FailedFetchPolicy::Omit
    };

    let mut crawler = Crawler::new()
        .with_max_depth(options.max_depth)
        .with_max_concurrency(options.max_concurrency)
        .with_timeout(Duration::from_secs(options.timeout_secs))
        .with_same_host_only(options.same_host_only)
        .with_failed_fetch_policy(policy);

    if let Some(secs) = options.crawl_timeout_secs {
        crawler = crawler.with_crawl_timeout(Duration::from_secs(secs));
    }
    if let Some(ref user_agent) = options.user_agent {
        crawler = crawler.with_user_agent(user_agent.as_str());
    }
    crawler
}

/// Execute a crawl of every seed in `options` and merge the graphs.
///
/// A seed that cannot be crawled (malformed URL, bad bounds) is reported
/// through `progress_callback` and skipped; the call only fails when no seed
/// could be crawled at all.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    result_callback: Option<CrawlResultCallback>,
) -> Result<CrawlSummary, String> {
    if options.urls.is_empty() {
        return Err("No seed URLs provided".to_string());
    }

    let started_at = Utc::now();

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let dispatched_count = Arc::new(AtomicUsize::new(0));
    let pages: Arc<StdMutex<Vec<PageResult>>> = Arc::new(StdMutex::new(Vec::new()));

    let internal_progress: ProgressCallback = {
        let pb = progress_bar.clone();
        let count = dispatched_count.clone();
        Arc::new(move |depth: usize, url: String| {
            let n = count.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(format!("Crawling... {} URLs dispatched (depth {}: {})", n, depth, url));
                pb.tick();
            }
        })
    };

    let internal_result: ResultCallback = {
        let pages = pages.clone();
        let forward = result_callback.clone();
        Arc::new(move |page: PageResult| {
            if let Some(ref cb) = forward {
                cb(page.clone());
            }
            if let Ok(mut pages) = pages.lock() {
                pages.push(page);
            }
        })
    };

    let crawler = build_crawler(&options)
        .with_progress_callback(internal_progress)
        .with_result_callback(internal_result);

    let mut graph = LinkGraph::new();
    let mut stats = CrawlStats::default();
    let mut crawled = Vec::new();
    let mut failures = Vec::new();

    for (idx, url_str) in options.urls.iter().enumerate() {
        if let Some(ref callback) = progress_callback
            && options.urls.len() > 1
        {
            callback(format!(
                "Crawling seed {}/{}: {}",
                idx + 1,
                options.urls.len(),
                url_str
            ));
        }

        match crawler.run(url_str).await {
            Ok(outcome) => {
                stats.absorb(&outcome.stats);
                graph.merge(outcome.graph);
                crawled.push(url_str.clone());
            }
            Err(e) => {
                warn!("Failed to crawl {}: {}", url_str, e);
                if let Some(ref callback) = progress_callback {
                    callback(format!("[!]  Failed to crawl {}: {}", url_str, e));
                }
                failures.push(format!("{}: {}", url_str, e));
            }
        }
    }

    if let Some(ref pb) = progress_bar {
        let total = dispatched_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs dispatched", total));
    }

    if crawled.is_empty() {
        return Err(failures.join("; "));
    }

    // Seeds are crawled independently, so a location shared between them is
    // fetched and reported once per seed. Count and list it once.
    stats.edges = graph.edge_count();
    stats.discovered = graph.locations().len();
    let pages = pages.lock().map(|p| dedup_pages(&p)).unwrap_or_default();

    Ok(CrawlSummary {
        seeds: crawled,
        graph,
        stats,
        pages,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Keep the first result seen for each URL.
fn dedup_pages(pages: &[PageResult]) -> Vec<PageResult> {
    let mut seen = HashSet::new();
    pages
        .iter()
        .filter(|page| seen.insert(page.url.clone()))
        .cloned()
        .collect()
}

/// Run a crawl to completion from synchronous code.
pub fn crawl_blocking(
    seed: &str,
    max_depth: usize,
    max_concurrency: usize,
) -> Result<LinkGraph, CrawlError> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(linkmap_scanner::crawl(seed, max_depth, max_concurrency))
}
