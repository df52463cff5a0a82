//! Request classification.
//!
//! A pure predicate with no side effects, evaluated once per intercepted
//! request.

use http::Method;
use url::Url;

/// Fetch strategy for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from the versioned bucket if present, fetch on miss.
    CacheFirst,
    /// Always hit the network; never read or write the cache.
    NetworkOnly,
}

/// Classify a request.
///
/// Non-GET requests are network-only regardless of host: writes to the
/// document store and auth token exchanges must never be cached. The method
/// check short-circuits before any pattern test. Otherwise a request is
/// network-only when the full URL string contains any configured pattern
/// (simple substring containment, not a regex).
pub fn classify(method: &Method, url: &Url, network_only: &[String]) -> Strategy {
    if *method != Method::GET {
        return Strategy::NetworkOnly;
    }

    let href = url.as_str();
    if network_only.iter().any(|pattern| href.contains(pattern.as_str())) {
        return Strategy::NetworkOnly;
    }

    Strategy::CacheFirst
}
