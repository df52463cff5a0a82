//! # Likhlo Offline Worker
//!
//! Offline caching subsystem for the Likhlo notes PWA.
//!
//! ## Features
//!
//! - **Lifecycle**: install (atomic precache), activate (stale-bucket sweep)
//! - **Request routing**: cache-first for static assets, network-only for
//!   the auth/database provider's domains and all non-GET requests
//! - **Cache-first fetch**: serve from the versioned bucket, fall back to
//!   network, degrade to a synthetic 503 when offline
//! - **Control channel**: `SKIP_WAITING` and `CACHE_URLS` messages from
//!   controlled pages
//!
//! ## Architecture
//!
//! ```text
//! Host adapter (worker runtime)
//!     │
//!     └── OfflineWorker
//!             ├── handle_install ───→ CacheStorage (bucket per version)
//!             ├── handle_activate ──→ stale-bucket sweep + client claim
//!             ├── handle_fetch ─────→ Router ──→ CacheFirst │ NetworkOnly
//!             │                                     │             │
//!             │                                CacheStorage   NetworkFetch
//!             └── handle_message ───→ SKIP_WAITING / CACHE_URLS
//! ```
//!
//! The worker performs no I/O of its own: the cache store and the network
//! fetcher are injected behind traits, so a host adapter binds them to the
//! real platform and tests bind them to in-memory doubles.

use bytes::Bytes;
use hashbrown::HashMap;
use http::{Method, StatusCode};
use thiserror::Error;
use url::Url;

pub mod cache;
pub mod config;
pub mod router;
pub mod worker;

pub use cache::{CacheEntry, CacheStorage, MemoryCacheStorage};
pub use config::WorkerConfig;
pub use router::{classify, Strategy};
pub use worker::{Client, NetworkFetch, OfflineWorker, WorkerMessage, WorkerState};

// ==================== Errors ====================

/// Errors that can occur in offline worker operations.
#[derive(Error, Debug, Clone)]
pub enum SwError {
    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// ==================== Request ====================

/// An intercepted request: method plus full target URL.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request method.
    pub method: Method,

    /// Absolute request URL.
    pub url: Url,

    /// Request headers.
    pub headers: HashMap<String, String>,
}

impl FetchRequest {
    /// Create a request with the given method and URL.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
        }
    }

    /// Create a GET request from a URL string.
    pub fn get(url: &str) -> Result<Self, SwError> {
        let url = Url::parse(url).map_err(|e| SwError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(Method::GET, url))
    }
}

// ==================== Response ====================

/// Response kind as observed by the interception layer.
///
/// Opaque responses (cross-origin, no-cors) are returned to the caller but
/// never written to the cache, even with status 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Basic,
    Opaque,
}

/// A buffered response.
///
/// The body is held as [`Bytes`], so a response is a cheaply cloneable value:
/// one copy goes to the caller and one to the cache writer, with neither
/// consuming the other.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: StatusCode,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Buffered response body.
    pub body: Bytes,

    /// Response kind.
    pub kind: ResponseKind,

    /// Whether this response was served from the cache.
    pub from_cache: bool,
}

impl FetchResponse {
    /// Create a 200 response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HashMap::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
            from_cache: false,
        }
    }

    /// Create a response with the given status and empty body.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
            kind: ResponseKind::Basic,
            from_cache: false,
        }
    }

    /// Synthetic response for a cache-first network failure.
    pub fn offline() -> Self {
        Self::synthetic(StatusCode::SERVICE_UNAVAILABLE, "You are offline")
    }

    /// Synthetic response for a network-only fetch failure.
    pub fn request_timeout() -> Self {
        Self::synthetic(StatusCode::REQUEST_TIMEOUT, "Network error occurred")
    }

    fn synthetic(status: StatusCode, body: &'static str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        Self {
            status,
            headers,
            body: Bytes::from_static(body.as_bytes()),
            kind: ResponseKind::Basic,
            from_cache: false,
        }
    }

    /// Set a header, consuming and returning the response.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Mark the response as opaque.
    pub fn opaque(mut self) -> Self {
        self.kind = ResponseKind::Opaque;
        self
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    /// Get the body as text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Whether this response may be written to the cache.
    ///
    /// Only basic responses with status exactly 200 are cached; redirects,
    /// errors, and opaque responses pass through uncached.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && self.kind == ResponseKind::Basic
    }
}
