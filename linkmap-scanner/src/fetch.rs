use crate::error::{CrawlError, FetchError};
use crate::location::Location;
use futures::future::BoxFuture;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "linkmap/0.1 (https://github.com/trapdoorsec/linkmap)";

/// A successfully retrieved representation of a location.
///
/// `location` is what was requested and keys the graph; `base` is where the
/// body was finally served from after redirects, and relative links resolve
/// against it.
#[derive(Debug, Clone)]
pub struct Document {
    pub location: Location,
    pub base: Location,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub response_time: Duration,
}

impl Document {
    pub fn is_html(&self) -> bool {
        is_html_content_type(self.content_type.as_deref())
    }
}

/// Responses without a content type are assumed to be markup.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
        .unwrap_or(true)
}

/// One retrieval of one location. Implementations must not retry and must
/// not touch any crawl state; the engine calls them from spawned tasks.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, location: &Location) -> BoxFuture<'static, Result<Document, FetchError>>;
}

/// `Fetcher` backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &Location) -> BoxFuture<'static, Result<Document, FetchError>> {
        let client = self.client.clone();
        let location = location.clone();

        Box::pin(async move {
            debug!("Fetching {}", location);

            let start = Instant::now();
            let response = client
                .get(location.as_str())
                .header(ACCEPT, "text/html")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let base = Location::parse(response.url().as_str()).unwrap_or_else(|_| location.clone());
            if base != location {
                debug!("{} redirected to {}", location, base);
            }

            // Non-markup bodies are never read
            let body = if is_html_content_type(content_type.as_deref()) {
                response.text().await?
            } else {
                String::new()
            };
            let response_time = start.elapsed();

            Ok(Document {
                location,
                base,
                status_code: status.as_u16(),
                content_type,
                body,
                response_time,
            })
        })
    }
}
