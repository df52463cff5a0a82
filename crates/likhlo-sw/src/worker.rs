//! The offline worker: lifecycle state machine, fetch strategies, control
//! channel, and the registry of controlled pages.
//!
//! The hosting runtime drives the lifecycle by calling the four entry points
//! directly: [`OfflineWorker::handle_install`], [`handle_activate`],
//! [`handle_fetch`], and [`handle_message`]. Fetch interceptions may be
//! dispatched concurrently; all coordination happens through the injected
//! [`CacheStorage`], which is atomic per key.
//!
//! [`handle_activate`]: OfflineWorker::handle_activate
//! [`handle_fetch`]: OfflineWorker::handle_fetch
//! [`handle_message`]: OfflineWorker::handle_message

use hashbrown::HashMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use async_trait::async_trait;
use http::Method;

use crate::cache::{CacheEntry, CacheStorage};
use crate::config::WorkerConfig;
use crate::router::{classify, Strategy};
use crate::{FetchRequest, FetchResponse, SwError};

// ==================== State ====================

/// Worker lifecycle state. Transitions are driven by the hosting runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Initial state, before install.
    Parsed,
    /// Install in progress (precaching the manifest).
    Installing,
    /// Installed, waiting for activation.
    Installed,
    /// Activation in progress (sweeping stale buckets, claiming pages).
    Activating,
    /// Active and controlling pages.
    Activated,
    /// Replaced, or install failed.
    Redundant,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        write!(f, "{s}")
    }
}

// ==================== Network Seam ====================

/// Network access for the worker.
///
/// The host adapter binds this to the platform's fetch; tests bind it to a
/// scripted double. No timeout is applied here: a hang in the underlying
/// fetch hangs the corresponding interception only.
#[async_trait]
pub trait NetworkFetch: Send + Sync {
    /// Perform the request against the network.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SwError>;
}

// ==================== Clients ====================

/// A controlled (or controllable) page.
#[derive(Debug, Clone)]
pub struct Client {
    /// Client ID, assigned by the host.
    pub id: String,

    /// Page URL.
    pub url: Url,

    /// Whether this worker controls the page.
    pub controlled: bool,
}

// ==================== Control Messages ====================

/// Structured messages sent by controlled pages.
///
/// Unrecognized message kinds fail deserialization and are ignored, keeping
/// the channel forward-compatible.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    /// Force a waiting worker to activate immediately.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,

    /// Fetch and cache additional URLs not known at install time.
    #[serde(rename = "CACHE_URLS")]
    CacheUrls { urls: Vec<String> },
}

// ==================== Offline Worker ====================

/// The offline worker.
pub struct OfflineWorker {
    config: WorkerConfig,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    cache: Arc<dyn CacheStorage>,
    network: Arc<dyn NetworkFetch>,
    clients: RwLock<HashMap<String, Client>>,
}

impl OfflineWorker {
    /// Create a worker with the given configuration and platform seams.
    pub fn new(
        config: WorkerConfig,
        cache: Arc<dyn CacheStorage>,
        network: Arc<dyn NetworkFetch>,
    ) -> Self {
        Self {
            config,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            cache,
            network,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// The worker's configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether the worker has signaled intent to activate without waiting
    /// for all tabs to close.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Relaxed)
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    // ==================== Install ====================

    /// Install: open the current version's bucket and precache the manifest.
    ///
    /// All-or-nothing: one failed manifest fetch fails the whole install and
    /// the worker goes redundant. The platform owns retry by re-registering;
    /// nothing is retried here. On success the worker requests skip-waiting
    /// so activation is immediately eligible.
    pub async fn handle_install(&self) -> Result<(), SwError> {
        self.set_state(WorkerState::Installing).await;
        let bucket = self.config.bucket_name();
        info!(
            bucket = %bucket,
            assets = self.config.static_assets.len(),
            "installing offline worker"
        );

        if let Err(e) = self.precache_manifest(&bucket).await {
            error!(bucket = %bucket, error = %e, "install failed");
            self.set_state(WorkerState::Redundant).await;
            return Err(e);
        }

        self.skip_waiting.store(true, Ordering::Relaxed);
        self.set_state(WorkerState::Installed).await;
        info!(bucket = %bucket, "static assets cached");
        Ok(())
    }

    async fn precache_manifest(&self, bucket: &str) -> Result<(), SwError> {
        self.cache.open(bucket).await?;

        for path in &self.config.static_assets {
            let url = self.config.resolve(path)?;
            let request = FetchRequest::new(Method::GET, url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| SwError::InstallFailed(format!("{path}: {e}")))?;
            if !response.is_cacheable() {
                return Err(SwError::InstallFailed(format!(
                    "{path}: status {}",
                    response.status
                )));
            }
            let entry = CacheEntry::from_response(url.as_str(), &response);
            self.cache.put(bucket, url.as_str(), entry).await?;
            debug!(url = %url, "precached asset");
        }

        Ok(())
    }

    // ==================== Activate ====================

    /// Activate: sweep stale buckets, then claim all registered pages.
    ///
    /// Does not return until both finish, so no page is ever routed through
    /// a worker with a half-cleaned bucket set. A single failed deletion is
    /// logged and skipped; it blocks neither the rest of the sweep nor the
    /// claim.
    pub async fn handle_activate(&self) -> Result<(), SwError> {
        self.set_state(WorkerState::Activating).await;
        let current = self.config.bucket_name();

        for name in self.cache.keys().await {
            if name == current {
                continue;
            }
            match self.cache.delete_bucket(&name).await {
                Ok(_) => info!(bucket = %name, "deleted stale cache bucket"),
                Err(e) => warn!(bucket = %name, error = %e, "failed to delete stale bucket"),
            }
        }

        let claimed = self.claim_clients().await;
        self.set_state(WorkerState::Activated).await;
        info!(bucket = %current, clients = claimed, "offline worker activated");
        Ok(())
    }

    // ==================== Fetch ====================

    /// Intercept a request and produce a response.
    ///
    /// Always resolves with a response: network failures degrade to
    /// synthetic 503 (cache-first) or 408 (network-only) responses and are
    /// never surfaced as errors to the page.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchResponse {
        match classify(&request.method, &request.url, &self.config.network_only) {
            Strategy::NetworkOnly => self.network_only(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn network_only(&self, request: &FetchRequest) -> FetchResponse {
        trace!(url = %request.url, method = %request.method, "network-only fetch");
        match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %request.url, error = %e, "network request failed");
                FetchResponse::request_timeout()
            }
        }
    }

    async fn cache_first(&self, request: &FetchRequest) -> FetchResponse {
        let bucket = self.config.bucket_name();
        let key = request.url.as_str();

        if let Some(entry) = self.cache.match_url(&bucket, key).await {
            debug!(url = %request.url, "serving from cache");
            return entry.to_response();
        }

        debug!(url = %request.url, "cache miss, fetching from network");
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    let entry = CacheEntry::from_response(key, &response);
                    if let Err(e) = self.cache.put(&bucket, key, entry).await {
                        warn!(url = %request.url, error = %e, "failed to cache response");
                    }
                }
                response
            }
            Err(e) => {
                error!(url = %request.url, error = %e, "fetch failed");
                FetchResponse::offline()
            }
        }
    }

    // ==================== Control Channel ====================

    /// Handle a message from a controlled page.
    ///
    /// Unrecognized kinds are a silent no-op.
    pub async fn handle_message(&self, message: serde_json::Value) -> Result<(), SwError> {
        let Ok(message) = serde_json::from_value::<WorkerMessage>(message) else {
            trace!("ignoring unrecognized message");
            return Ok(());
        };

        match message {
            WorkerMessage::SkipWaiting => {
                let state = self.state().await;
                if state == WorkerState::Installed {
                    info!("skip-waiting requested, activating");
                    self.handle_activate().await
                } else {
                    debug!(%state, "skip-waiting ignored");
                    Ok(())
                }
            }
            WorkerMessage::CacheUrls { urls } => {
                self.cache_urls(&urls).await;
                Ok(())
            }
        }
    }

    /// Fetch and cache URLs on demand. Best-effort, unlike install:
    /// individual failures are logged and skipped.
    async fn cache_urls(&self, urls: &[String]) {
        let bucket = self.config.bucket_name();
        for raw in urls {
            let url = match self.config.resolve(raw) {
                Ok(url) => url,
                Err(e) => {
                    warn!(url = %raw, error = %e, "skipping unresolvable url");
                    continue;
                }
            };
            let request = FetchRequest::new(Method::GET, url.clone());
            match self.network.fetch(&request).await {
                Ok(response) if response.is_cacheable() => {
                    let entry = CacheEntry::from_response(url.as_str(), &response);
                    match self.cache.put(&bucket, url.as_str(), entry).await {
                        Ok(()) => debug!(url = %url, "cached on demand"),
                        Err(e) => warn!(url = %url, error = %e, "failed to cache"),
                    }
                }
                Ok(response) => {
                    warn!(url = %url, status = %response.status, "not caching response")
                }
                Err(e) => warn!(url = %url, error = %e, "on-demand fetch failed"),
            }
        }
    }

    // ==================== Clients ====================

    /// Register a page that this worker may control.
    pub async fn register_client(&self, id: impl Into<String>, url: Url) {
        let id = id.into();
        let controlled = self.state().await == WorkerState::Activated;
        self.clients.write().await.insert(
            id.clone(),
            Client {
                id,
                url,
                controlled,
            },
        );
    }

    /// Remove a page (tab closed).
    pub async fn unregister_client(&self, id: &str) -> Option<Client> {
        self.clients.write().await.remove(id)
    }

    /// IDs of the pages this worker currently controls.
    pub async fn controlled_clients(&self) -> Vec<String> {
        self.clients
            .read()
            .await
            .values()
            .filter(|c| c.controlled)
            .map(|c| c.id.clone())
            .collect()
    }

    async fn claim_clients(&self) -> usize {
        let mut clients = self.clients.write().await;
        for client in clients.values_mut() {
            client.controlled = true;
        }
        clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStorage;
    use http::StatusCode;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Scripted network double: URL-keyed canned responses, a global offline
    /// switch, and a call counter for cache-hit assertions.
    struct ScriptedNetwork {
        routes: Mutex<HashMap<String, FetchResponse>>,
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    impl ScriptedNetwork {
        fn new() -> Self {
            Self {
                routes: Mutex::new(HashMap::new()),
                offline: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        fn route(&self, url: &str, response: FetchResponse) {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        fn serve_manifest(&self, config: &WorkerConfig) {
            for path in &config.static_assets {
                let url = config.resolve(path).unwrap();
                self.route(url.as_str(), FetchResponse::ok(format!("asset {path}")));
            }
        }

        fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::Relaxed);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl NetworkFetch for ScriptedNetwork {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SwError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.offline.load(Ordering::Relaxed) {
                return Err(SwError::NetworkError("connection refused".to_string()));
            }
            let routes = self.routes.lock().unwrap();
            Ok(routes
                .get(request.url.as_str())
                .cloned()
                .unwrap_or_else(|| FetchResponse::status(StatusCode::NOT_FOUND)))
        }
    }

    /// Storage wrapper whose delete refuses one specific bucket.
    struct StuckBucketStorage {
        inner: MemoryCacheStorage,
        stuck: String,
    }

    #[async_trait]
    impl CacheStorage for StuckBucketStorage {
        async fn open(&self, bucket: &str) -> Result<(), SwError> {
            self.inner.open(bucket).await
        }
        async fn keys(&self) -> Vec<String> {
            self.inner.keys().await
        }
        async fn delete_bucket(&self, bucket: &str) -> Result<bool, SwError> {
            if bucket == self.stuck {
                return Err(SwError::CacheError(format!("{bucket} is busy")));
            }
            self.inner.delete_bucket(bucket).await
        }
        async fn match_url(&self, bucket: &str, url: &str) -> Option<CacheEntry> {
            self.inner.match_url(bucket, url).await
        }
        async fn put(&self, bucket: &str, url: &str, entry: CacheEntry) -> Result<(), SwError> {
            self.inner.put(bucket, url, entry).await
        }
        async fn urls(&self, bucket: &str) -> Vec<String> {
            self.inner.urls(bucket).await
        }
    }

    fn small_config() -> WorkerConfig {
        WorkerConfig {
            static_assets: vec!["/a.html".to_string(), "/b.js".to_string()],
            ..WorkerConfig::default()
        }
    }

    fn setup(config: WorkerConfig) -> (Arc<MemoryCacheStorage>, Arc<ScriptedNetwork>, OfflineWorker) {
        let cache = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(ScriptedNetwork::new());
        let worker = OfflineWorker::new(config, cache.clone(), network.clone());
        (cache, network, worker)
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);

        worker.handle_install().await.unwrap();

        assert_eq!(worker.state().await, WorkerState::Installed);
        assert!(worker.skip_waiting_requested());
        let mut urls = cache.urls(&config.bucket_name()).await;
        urls.sort();
        assert_eq!(
            urls,
            vec!["https://likhlo.app/a.html", "https://likhlo.app/b.js"]
        );
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let config = small_config();
        let (_, network, worker) = setup(config.clone());
        // Only /a.html is routed; the unrouted /b.js comes back 404, which
        // is not cacheable and must fail the whole batch.
        network.route(
            config.resolve("/a.html").unwrap().as_str(),
            FetchResponse::ok("a"),
        );

        let err = worker.handle_install().await.unwrap_err();
        assert!(matches!(err, SwError::InstallFailed(_)));
        assert_eq!(worker.state().await, WorkerState::Redundant);
        assert!(!worker.skip_waiting_requested());
    }

    #[tokio::test]
    async fn test_install_fails_on_network_error() {
        let config = small_config();
        let (_, network, worker) = setup(config.clone());
        network.set_offline(true);

        assert!(worker.handle_install().await.is_err());
        assert_eq!(worker.state().await, WorkerState::Redundant);
    }

    #[tokio::test]
    async fn test_activate_sweeps_stale_buckets() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        cache.open("likhlo-cache-v1.9.0").await.unwrap();
        cache.open("likhlo-cache-v2.0.0-old").await.unwrap();

        worker.handle_install().await.unwrap();
        worker.handle_activate().await.unwrap();

        assert_eq!(worker.state().await, WorkerState::Activated);
        assert_eq!(cache.keys().await, vec!["likhlo-cache-v2.0.1"]);
    }

    #[tokio::test]
    async fn test_activate_tolerates_failed_deletion() {
        let config = small_config();
        let cache = Arc::new(StuckBucketStorage {
            inner: MemoryCacheStorage::new(),
            stuck: "likhlo-cache-v1.9.0".to_string(),
        });
        let network = Arc::new(ScriptedNetwork::new());
        network.serve_manifest(&config);
        let worker = OfflineWorker::new(config.clone(), cache.clone(), network);

        cache.open("likhlo-cache-v1.9.0").await.unwrap();
        cache.open("likhlo-cache-v2.0.0-old").await.unwrap();
        worker.register_client("tab-1", Url::parse("https://likhlo.app/dashboard.html").unwrap())
            .await;

        worker.handle_install().await.unwrap();
        worker.handle_activate().await.unwrap();

        // The stuck bucket survives, the other stale one is gone, and the
        // page was still claimed.
        assert_eq!(worker.state().await, WorkerState::Activated);
        let mut keys = cache.keys().await;
        keys.sort();
        assert_eq!(keys, vec!["likhlo-cache-v1.9.0", "likhlo-cache-v2.0.1"]);
        assert_eq!(worker.controlled_clients().await, vec!["tab-1"]);
    }

    #[tokio::test]
    async fn test_activate_claims_clients() {
        let config = small_config();
        let (_, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.register_client("tab-1", Url::parse("https://likhlo.app/").unwrap()).await;
        worker.register_client("tab-2", Url::parse("https://likhlo.app/index.html").unwrap())
            .await;

        assert!(worker.controlled_clients().await.is_empty());
        worker.handle_install().await.unwrap();
        worker.handle_activate().await.unwrap();

        let mut controlled = worker.controlled_clients().await;
        controlled.sort();
        assert_eq!(controlled, vec!["tab-1", "tab-2"]);

        // Closing a tab drops it from the controlled set.
        worker.unregister_client("tab-2").await;
        assert_eq!(worker.controlled_clients().await, vec!["tab-1"]);
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_network_call() {
        let config = small_config();
        let (_, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();
        worker.handle_activate().await.unwrap();
        let calls_after_install = network.calls();

        let request = FetchRequest::get("https://likhlo.app/a.html").unwrap();
        let response = worker.handle_fetch(&request).await;

        assert!(response.from_cache);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(network.calls(), calls_after_install);
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_and_caches() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        let icon = "https://likhlo.app/icons/icon-192x192.png";
        network.route(icon, FetchResponse::ok("png bytes"));
        worker.handle_install().await.unwrap();
        worker.handle_activate().await.unwrap();

        let request = FetchRequest::get(icon).unwrap();
        let first = worker.handle_fetch(&request).await;
        assert_eq!(first.status, StatusCode::OK);
        assert!(!first.from_cache);
        assert!(cache.match_url(&config.bucket_name(), icon).await.is_some());

        // Second identical request: served from cache, zero network calls.
        let calls = network.calls();
        let second = worker.handle_fetch(&request).await;
        assert!(second.from_cache);
        assert_eq!(second.body, first.body);
        assert_eq!(network.calls(), calls);
    }

    #[tokio::test]
    async fn test_non_200_response_is_not_cached() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();
        let missing = "https://likhlo.app/gone.html";
        // Unrouted URL -> 404 from the double.

        let response = worker
            .handle_fetch(&FetchRequest::get(missing).unwrap())
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(cache.match_url(&config.bucket_name(), missing).await.is_none());
    }

    #[tokio::test]
    async fn test_opaque_200_is_not_cached() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();
        let cdn = "https://cdn.example.com/widget.js";
        network.route(cdn, FetchResponse::ok("widget").opaque());

        let response = worker.handle_fetch(&FetchRequest::get(cdn).unwrap()).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(cache.match_url(&config.bucket_name(), cdn).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_first_offline_returns_503() {
        let config = small_config();
        let (_, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();
        network.set_offline(true);

        let response = worker
            .handle_fetch(&FetchRequest::get("https://likhlo.app/uncached.html").unwrap())
            .await;
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text().unwrap(), "You are offline");
    }

    #[tokio::test]
    async fn test_network_only_is_never_cached() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();
        let auth = "https://identitytoolkit.googleapis.com/v1/token";
        network.route(auth, FetchResponse::ok("{\"token\":\"t\"}"));

        let response = worker.handle_fetch(&FetchRequest::get(auth).unwrap()).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(!response.from_cache);
        assert!(cache.match_url(&config.bucket_name(), auth).await.is_none());

        // And when offline it degrades to a synthetic 408.
        network.set_offline(true);
        let offline = worker.handle_fetch(&FetchRequest::get(auth).unwrap()).await;
        assert_eq!(offline.status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(offline.text().unwrap(), "Network error occurred");
    }

    #[tokio::test]
    async fn test_post_to_asset_url_bypasses_cache() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();

        let url = Url::parse("https://likhlo.app/a.html").unwrap();
        let request = FetchRequest::new(Method::POST, url.clone());
        let response = worker.handle_fetch(&request).await;

        // Even though the GET entry exists, the POST went to the network.
        assert!(!response.from_cache);
        let entry = cache
            .match_url(&config.bucket_name(), url.as_str())
            .await
            .unwrap();
        assert_eq!(entry.body, b"asset /a.html");
    }

    #[tokio::test]
    async fn test_skip_waiting_message_activates() {
        let config = small_config();
        let (_, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Installed);

        worker
            .handle_message(json!({ "type": "SKIP_WAITING" }))
            .await
            .unwrap();
        assert_eq!(worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_cache_urls_message() {
        let config = small_config();
        let (cache, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();
        network.route(
            "https://likhlo.app/help.html",
            FetchResponse::ok("help page"),
        );

        worker
            .handle_message(json!({
                "type": "CACHE_URLS",
                "urls": ["/help.html", "/does-not-exist.html"]
            }))
            .await
            .unwrap();

        let bucket = config.bucket_name();
        // The resolvable 200 was cached; the 404 was skipped, not fatal.
        assert!(cache
            .match_url(&bucket, "https://likhlo.app/help.html")
            .await
            .is_some());
        assert!(cache
            .match_url(&bucket, "https://likhlo.app/does-not-exist.html")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_message_is_ignored() {
        let config = small_config();
        let (_, network, worker) = setup(config.clone());
        network.serve_manifest(&config);
        worker.handle_install().await.unwrap();

        worker
            .handle_message(json!({ "type": "SYNC_NOTES", "tag": "sync-notes" }))
            .await
            .unwrap();
        worker.handle_message(json!("not even an object")).await.unwrap();

        assert_eq!(worker.state().await, WorkerState::Installed);
    }
}
