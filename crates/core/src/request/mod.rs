//! Intercepted request representation.
//!
//! A [`CacheRequest`] carries the two things the engine inspects: the
//! method and the canonical target URL. Its identity (method + URL) is what
//! cache entries are keyed by.

pub mod url;

pub use self::url::{UrlError, canonicalize, resolve};

use crate::Error;
use crate::cache::hash::compute_cache_key;

/// A request delivered to the engine by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    method: String,
    url: ::url::Url,
}

impl CacheRequest {
    /// Build a request from a method and a raw URL string.
    ///
    /// The method is upper-cased and the URL canonicalized.
    pub fn new(method: &str, url: &str) -> Result<Self, Error> {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { method, url })
    }

    /// Shorthand for a GET request.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new("GET", url)
    }

    /// Build a GET request from an already-canonical URL.
    pub fn from_url(url: ::url::Url) -> Self {
        Self { method: "GET".to_string(), url }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &::url::Url {
        &self.url
    }

    /// Target host, already lowercased.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Content-addressed identity used as the cache key.
    pub fn identity(&self) -> String {
        compute_cache_key(&self.method, self.url.as_str())
    }
}

impl std::fmt::Display for CacheRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
