//! Request descriptors and URL canonicalization

use super::Headers;
use crate::error::{CacheError, CacheResult};
use std::fmt;
use url::Url;

/// Base URL of the intercepted application
///
/// Relative URLs resolve against it and its origin decides whether a
/// network response is same-origin (`basic`) or cross-origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    base: Url,
}

impl Scope {
    /// Parse a scope from an absolute base URL
    pub fn parse(base: &str) -> CacheResult<Self> {
        let base = Url::parse(base).map_err(|e| CacheError::InvalidUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a possibly relative URL to its canonical absolute form
    pub fn resolve(&self, url: &str) -> CacheResult<Url> {
        let mut resolved = self.base.join(url).map_err(|e| CacheError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        resolved.set_fragment(None);
        Ok(resolved)
    }

    /// Build a GET descriptor for a possibly relative URL
    pub fn request(&self, url: &str) -> CacheResult<RequestDescriptor> {
        Ok(RequestDescriptor::get(self.resolve(url)?))
    }

    /// Whether `url` shares this scope's origin
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
    }
}

/// Method, URL and headers of an intercepted request; the cache lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: String,
    url: Url,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    pub fn new(method: &str, mut url: Url) -> Self {
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Canonical key: `"{METHOD} {absolute-url}"`
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
