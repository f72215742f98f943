//! Stored responses.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A response as the cache stores it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl CachedResponse {
    /// A response with no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Bytes charged against a partition quota.
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

/// A stored response plus when it was stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// The stored response.
    pub response: CachedResponse,
    /// When the response was first written or last overwritten.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Stamp `response` with the current time.
    pub fn new(response: CachedResponse) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
        }
    }
}
