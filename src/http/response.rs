//! Responses with a single-read body

use super::Headers;
use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a response by how it was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin, readable
    Basic,
    /// Cross-origin, readable because the server allowed it
    Cors,
    /// Cross-origin without permission; status and body are hidden
    Opaque,
    /// Redirect that was not followed
    #[serde(rename = "opaqueredirect")]
    OpaqueRedirect,
    /// Network-level error
    Error,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Cors => write!(f, "cors"),
            Self::Opaque => write!(f, "opaque"),
            Self::OpaqueRedirect => write!(f, "opaqueredirect"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// An HTTP response whose body can be read once
///
/// Use [`Response::try_clone`] before the body is read when two consumers
/// need the full payload.
#[derive(Debug)]
pub struct Response {
    status: u16,
    kind: ResponseType,
    url: Option<String>,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl Response {
    pub fn new(status: u16, kind: ResponseType, body: Vec<u8>) -> Self {
        Self {
            status,
            kind,
            url: None,
            headers: Headers::new(),
            body: Some(body),
        }
    }

    /// Same-origin response
    pub fn basic(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, ResponseType::Basic, body.into())
    }

    /// Cross-origin response with hidden status, headers and body
    pub fn opaque() -> Self {
        Self::new(0, ResponseType::Opaque, Vec::new())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn kind(&self) -> ResponseType {
        self.kind
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Status in the 200-299 range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_used(&self) -> bool {
        self.body.is_none()
    }

    /// Status 200 from the same origin; the only responses written to a bucket
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic
    }

    /// Deep-copy the response, body included
    ///
    /// Fails once the body has been read.
    pub fn try_clone(&self) -> CacheResult<Response> {
        let body = self.body.clone().ok_or(CacheError::BodyUsed)?;
        Ok(Self {
            status: self.status,
            kind: self.kind,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: Some(body),
        })
    }

    /// Consume the body bytes
    pub fn bytes(&mut self) -> CacheResult<Vec<u8>> {
        self.body.take().ok_or(CacheError::BodyUsed)
    }

    /// Consume the body as UTF-8 text (lossy)
    pub fn text(&mut self) -> CacheResult<String> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
