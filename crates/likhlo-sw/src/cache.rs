//! Versioned cache storage.
//!
//! Buckets are named `{prefix}-{version}` and hold URL-keyed
//! request/response pairs. The store is the only shared mutable resource in
//! the subsystem; individual get/put/delete operations are atomic at
//! single-key granularity, so concurrent fetch interceptions need no
//! additional coordination (last writer wins per URL).

use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::{FetchResponse, ResponseKind, SwError};

// ==================== Cache Entry ====================

/// A cached request/response pair, keyed by request URL (GET only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request URL.
    pub url: String,

    /// Response status.
    pub status: u16,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Vec<u8>,

    /// Cached at timestamp (ms since epoch).
    pub cached_at: u64,
}

impl CacheEntry {
    /// Capture a response into an entry.
    pub fn from_response(url: &str, response: &FetchResponse) -> Self {
        Self {
            url: url.to_string(),
            status: response.status.as_u16(),
            headers: response.headers.clone(),
            body: response.body.to_vec(),
            cached_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }

    /// Rebuild a response from this entry, marked as served from cache.
    pub fn to_response(&self) -> FetchResponse {
        FetchResponse {
            status: StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK),
            headers: self.headers.clone(),
            body: Bytes::from(self.body.clone()),
            kind: ResponseKind::Basic,
            from_cache: true,
        }
    }
}

// ==================== Cache Storage ====================

/// Bucket-keyed, URL-keyed persistent response store.
///
/// The host adapter binds this to the platform's cache storage; tests bind
/// it to [`MemoryCacheStorage`].
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a bucket, creating it if absent.
    async fn open(&self, bucket: &str) -> Result<(), SwError>;

    /// Names of all existing buckets.
    async fn keys(&self) -> Vec<String>;

    /// Delete a bucket and everything in it. Returns whether it existed.
    async fn delete_bucket(&self, bucket: &str) -> Result<bool, SwError>;

    /// Look up an entry by URL within a bucket.
    async fn match_url(&self, bucket: &str, url: &str) -> Option<CacheEntry>;

    /// Store an entry under a URL, overwriting any previous entry.
    async fn put(&self, bucket: &str, url: &str, entry: CacheEntry) -> Result<(), SwError>;

    /// URLs of all entries in a bucket.
    async fn urls(&self, bucket: &str) -> Vec<String>;
}

/// In-memory cache storage: a mapping from bucket name to a mapping from
/// URL to entry.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<HashMap<String, HashMap<String, CacheEntry>>>,
}

impl MemoryCacheStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, bucket: &str) -> Result<(), SwError> {
        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn keys(&self) -> Vec<String> {
        self.buckets.read().await.keys().cloned().collect()
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, SwError> {
        Ok(self.buckets.write().await.remove(bucket).is_some())
    }

    async fn match_url(&self, bucket: &str, url: &str) -> Option<CacheEntry> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|entries| entries.get(url))
            .cloned()
    }

    async fn put(&self, bucket: &str, url: &str, entry: CacheEntry) -> Result<(), SwError> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(url.to_string(), entry);
        Ok(())
    }

    async fn urls(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}
