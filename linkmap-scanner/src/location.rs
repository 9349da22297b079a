use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A canonical, absolute http(s) address. Used as the graph key.
///
/// Canonical form is whatever `url` serializes after parsing (lowercased
/// scheme and host, default port dropped, empty path becomes `/`) with the
/// fragment removed, so `http://H/a#top` and `http://h/a` are the same
/// location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(Url);

impl Location {
    /// Parse a seed address. Rejects anything that is not an absolute
    /// http(s) URL with a host.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", input, e)))?;

        Self::from_url(url).ok_or_else(|| {
            CrawlError::InvalidUrl(format!("{}: expected an absolute http(s) URL with a host", input))
        })
    }

    /// Resolve an `href` found on this page into an absolute location.
    ///
    /// Returns `None` for references that do not point at a fetchable
    /// resource: empty values, in-page anchors, `javascript:`, `mailto:`,
    /// `tel:`, `data:` and any non-http scheme.
    pub fn resolve(&self, href: &str) -> Option<Self> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let lowered = href.to_ascii_lowercase();
        if ["javascript:", "mailto:", "tel:", "data:"]
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            return None;
        }

        let resolved = self.0.join(href).ok()?;
        Self::from_url(resolved)
    }

    fn from_url(mut url: Url) -> Option<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return None,
        }
        url.set_fragment(None);
        Some(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// The registrable part of the host used for same-host scoping: a leading
    /// `www.` is dropped so `www.example.com` and `example.com` share a scope.
    pub fn base_domain(&self) -> &str {
        let host = self.host();
        host.strip_prefix("www.").unwrap_or(host)
    }

    /// True when this location lives on `base_domain` or one of its subdomains.
    pub fn is_same_host(&self, base_domain: &str) -> bool {
        let host = self.host();
        host == base_domain || host.ends_with(&format!(".{}", base_domain))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for Location {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Location {
    type Error = CrawlError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.0.into()
    }
}
