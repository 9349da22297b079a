use thiserror::Error;

/// Errors that abort a crawl before it starts.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    ClientError(#[from] reqwest::Error),

    #[error("Runtime error: {0}")]
    RuntimeError(#[from] std::io::Error),
}

/// Why a single fetch failed. Never escalated past the engine.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected status code {0}")]
    Status(u16),

    #[error("Unreadable body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() || e.is_body() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Transport(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
