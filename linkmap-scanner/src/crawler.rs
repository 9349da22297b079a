use crate::error::{CrawlError, FetchError, Result};
use crate::extract::extract_document_links;
use crate::fetch::{DEFAULT_USER_AGENT, Document, Fetcher, HttpFetcher};
use crate::graph::{FailedFetchPolicy, LinkGraph};
use crate::location::Location;
use crate::result::{CrawlOutcome, CrawlStats, PageResult};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Called with `(depth, url)` each time a fetch is dispatched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Called with the outcome of every dispatched fetch.
pub type ResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Lifecycle of a single crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CrawlState {
    /// Seed not yet enqueued.
    Idle,
    /// Frontier has work, or fetches are in flight.
    Running,
    /// Frontier empty, fetches still in flight.
    Draining,
    /// Frontier empty and nothing in flight. Terminal.
    Complete,
}

impl CrawlState {
    fn observe(frontier_empty: bool, in_flight: usize) -> Self {
        match (frontier_empty, in_flight) {
            (true, 0) => CrawlState::Complete,
            (true, _) => CrawlState::Draining,
            _ => CrawlState::Running,
        }
    }
}

pub struct Crawler {
    fetcher: Option<Arc<dyn Fetcher>>,
    max_depth: usize,
    max_concurrency: usize,
    timeout: Duration,
    crawl_timeout: Option<Duration>,
    user_agent: String,
    failed_fetch_policy: FailedFetchPolicy,
    same_host_only: bool,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self {
            fetcher: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            crawl_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            failed_fetch_policy: FailedFetchPolicy::Omit,
            same_host_only: false,
            progress_callback: None,
            result_callback: None,
        }
    }

    /// Replace the default HTTP fetcher.
    pub fn with_fetcher<F: Fetcher>(mut self, fetcher: F) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Per-fetch timeout for the default HTTP fetcher.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop taking new work after `timeout`, let in-flight fetches finish and
    /// return whatever graph was built.
    pub fn with_crawl_timeout(mut self, timeout: Duration) -> Self {
        self.crawl_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_failed_fetch_policy(mut self, policy: FailedFetchPolicy) -> Self {
        self.failed_fetch_policy = policy;
        self
    }

    /// Only follow links on the seed's host and its subdomains. Edges to other
    /// hosts are still recorded.
    pub fn with_same_host_only(mut self, same_host_only: bool) -> Self {
        self.same_host_only = same_host_only;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Crawl from `seed` and return the link graph once the crawl is complete.
    pub async fn crawl(&self, seed: &str) -> Result<LinkGraph> {
        Ok(self.run(seed).await?.graph)
    }

    /// Like [`Crawler::crawl`], also returning the crawl counters.
    pub async fn run(&self, seed: &str) -> Result<CrawlOutcome> {
        let seed = Location::parse(seed)?;
        if self.max_concurrency == 0 {
            return Err(CrawlError::InvalidConfig(
                "max concurrency must be at least 1".to_string(),
            ));
        }

        let fetcher: Arc<dyn Fetcher> = match &self.fetcher {
            Some(fetcher) => fetcher.clone(),
            None => Arc::new(HttpFetcher::new(self.timeout, &self.user_agent)?),
        };

        info!(
            "Starting crawl of {} (max depth {}, max concurrency {})",
            seed, self.max_depth, self.max_concurrency
        );

        let outcome = CrawlEngine::new(self, fetcher, seed).drive().await;

        info!(
            "Crawl complete. Fetched {} pages ({} failed), {} edges",
            outcome.stats.fetched, outcome.stats.failed, outcome.stats.edges
        );
        Ok(outcome)
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// Crawl `seed` over HTTP with default settings and the given bounds.
pub async fn crawl(seed: &str, max_depth: usize, max_concurrency: usize) -> Result<LinkGraph> {
    Crawler::new()
        .with_max_depth(max_depth)
        .with_max_concurrency(max_concurrency)
        .crawl(seed)
        .await
}

#[derive(Debug)]
struct VisitRecord {
    depth: usize,
    visited: bool,
}

#[derive(Debug)]
struct FrontierEntry {
    location: Location,
    depth: usize,
}

struct Completion {
    location: Location,
    depth: usize,
    result: std::result::Result<Document, FetchError>,
}

enum Wake {
    Joined(Option<std::result::Result<Completion, JoinError>>),
    Deadline,
}

/// Sole owner of the frontier, visit records, graph and in-flight set.
/// Fetch tasks only ever hand back a `Completion`.
struct CrawlEngine<'a> {
    config: &'a Crawler,
    fetcher: Arc<dyn Fetcher>,
    base_domain: String,
    frontier: VecDeque<FrontierEntry>,
    visits: HashMap<Location, VisitRecord>,
    in_flight: JoinSet<Completion>,
    graph: LinkGraph,
    state: CrawlState,
    accepting: bool,
    stats: CrawlStats,
}

impl<'a> CrawlEngine<'a> {
    fn new(config: &'a Crawler, fetcher: Arc<dyn Fetcher>, seed: Location) -> Self {
        let mut engine = Self {
            config,
            fetcher,
            base_domain: seed.base_domain().to_string(),
            frontier: VecDeque::new(),
            visits: HashMap::new(),
            in_flight: JoinSet::new(),
            graph: LinkGraph::new(),
            state: CrawlState::Idle,
            accepting: true,
            stats: CrawlStats::default(),
        };
        engine.discover(seed, 0);
        engine
    }

    async fn drive(mut self) -> CrawlOutcome {
        let deadline = self.config.crawl_timeout.map(|timeout| Instant::now() + timeout);

        loop {
            self.dispatch_ready();
            self.transition();
            if self.state == CrawlState::Complete {
                break;
            }

            let wake = match deadline {
                Some(deadline) if self.accepting => tokio::select! {
                    joined = self.in_flight.join_next() => Wake::Joined(joined),
                    _ = tokio::time::sleep_until(deadline) => Wake::Deadline,
                },
                _ => Wake::Joined(self.in_flight.join_next().await),
            };

            match wake {
                Wake::Joined(Some(Ok(completion))) => self.complete(completion),
                Wake::Joined(Some(Err(e))) => warn!("Fetch task failed: {}", e),
                Wake::Joined(None) => {}
                Wake::Deadline => self.stop_accepting(),
            }
        }

        self.stats.discovered = self.visits.len();
        self.stats.edges = self.graph.edge_count();
        CrawlOutcome {
            graph: self.graph,
            stats: self.stats,
        }
    }

    fn dispatch_ready(&mut self) {
        while self.accepting && self.in_flight.len() < self.config.max_concurrency {
            let Some(entry) = self.frontier.pop_front() else {
                break;
            };
            self.dispatch(entry);
        }
    }

    fn dispatch(&mut self, entry: FrontierEntry) {
        if entry.depth > self.config.max_depth {
            debug!("Discarding {} at depth {}", entry.location, entry.depth);
            return;
        }

        // Marked before the fetch is spawned so a second discovery can never
        // schedule the same location while the first is outstanding.
        let record = self
            .visits
            .entry(entry.location.clone())
            .or_insert(VisitRecord {
                depth: entry.depth,
                visited: false,
            });
        if record.visited {
            return;
        }
        record.visited = true;
        let depth = record.depth;

        if let Some(ref callback) = self.config.progress_callback {
            callback(depth, entry.location.to_string());
        }

        debug!(
            "Dispatching {} at depth {} ({} in flight)",
            entry.location,
            depth,
            self.in_flight.len()
        );

        let fetch = self.fetcher.fetch(&entry.location);
        let location = entry.location;
        self.in_flight.spawn(async move {
            Completion {
                location,
                depth,
                result: fetch.await,
            }
        });
    }

    fn complete(&mut self, completion: Completion) {
        let Completion {
            location,
            depth,
            result,
        } = completion;

        let page = match result {
            Ok(document) => {
                self.stats.fetched += 1;
                self.graph.add_node(location.clone());

                for target in extract_document_links(&document) {
                    if target == location {
                        continue;
                    }
                    self.graph.add_edge(location.clone(), target.clone());
                    self.discover(target, depth + 1);
                }

                let mut page = PageResult::new(location.to_string(), depth);
                page.status_code = document.status_code;
                page.content_type = document.content_type;
                page.response_time = document.response_time;
                page.links_found = self.graph.targets(&location).map_or(0, |t| t.len());
                page
            }
            Err(e) => {
                warn!("Crawl error for {}: {}", location, e);
                self.stats.failed += 1;
                if self.config.failed_fetch_policy == FailedFetchPolicy::KeepEmpty {
                    self.graph.add_node(location.clone());
                }

                let mut page = PageResult::with_error(location.to_string(), depth, e.to_string());
                if let FetchError::Status(code) = e {
                    page.status_code = code;
                }
                page
            }
        };

        if let Some(ref callback) = self.config.result_callback {
            callback(page);
        }
    }

    /// Record a newly referenced location and queue it if it is new and in bounds.
    /// The first discovery fixes its depth.
    fn discover(&mut self, location: Location, depth: usize) {
        if !self.accepting || depth > self.config.max_depth {
            return;
        }
        if self.config.same_host_only && !location.is_same_host(&self.base_domain) {
            debug!("Not following off-host link {}", location);
            return;
        }
        if self.visits.contains_key(&location) {
            return;
        }

        self.visits.insert(
            location.clone(),
            VisitRecord {
                depth,
                visited: false,
            },
        );
        self.frontier.push_back(FrontierEntry { location, depth });
    }

    fn stop_accepting(&mut self) {
        warn!(
            "Crawl timeout reached: dropping {} queued locations, waiting on {} in flight",
            self.frontier.len(),
            self.in_flight.len()
        );
        self.accepting = false;
        self.stats.timed_out = true;
        self.frontier.clear();
    }

    fn transition(&mut self) {
        let next = CrawlState::observe(self.frontier.is_empty(), self.in_flight.len());
        if next != self.state {
            debug!("Crawl state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
