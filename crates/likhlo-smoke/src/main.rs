//! Likhlo offline-worker smoke harness.
//!
//! Exercises the full worker lifecycle against an in-memory network double:
//! install, activate, online fetches, cache hits, an offline window, and the
//! control channel. Prints a JSON summary of per-operation timings and cache
//! state at the end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::StatusCode;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use likhlo_sw::{
    CacheStorage, FetchRequest, FetchResponse, MemoryCacheStorage, NetworkFetch, OfflineWorker,
    SwError, WorkerConfig,
};

/// Performance timing collector for tracking operation durations.
struct PerfTiming {
    timings: Mutex<HashMap<&'static str, Vec<Duration>>>,
}

impl PerfTiming {
    fn new() -> Self {
        Self {
            timings: Mutex::new(HashMap::new()),
        }
    }

    fn record(&self, operation: &'static str, duration: Duration) {
        self.timings
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push(duration);
    }

    fn summary(&self) -> serde_json::Value {
        let timings = self.timings.lock().unwrap();
        let mut summary = serde_json::Map::new();

        for (op, durations) in timings.iter() {
            if durations.is_empty() {
                continue;
            }
            let count = durations.len();
            let total_ms: f64 = durations.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
            summary.insert(
                op.to_string(),
                json!({
                    "count": count,
                    "total_ms": (total_ms * 100.0).round() / 100.0,
                    "avg_ms": (total_ms / count as f64 * 100.0).round() / 100.0,
                }),
            );
        }

        serde_json::Value::Object(summary)
    }
}

/// In-memory network double: serves the static manifest plus a generic 200
/// for anything else, and can be flipped offline.
struct DemoNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl DemoNetwork {
    fn serving(config: &WorkerConfig) -> Result<Self, SwError> {
        let mut routes = HashMap::new();
        for path in &config.static_assets {
            let url = config.resolve(path)?;
            routes.insert(
                url.to_string(),
                FetchResponse::ok(format!("<!-- {path} -->")).with_header("content-type", "text/html"),
            );
        }
        Ok(Self {
            routes: Mutex::new(routes),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NetworkFetch for DemoNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SwError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.offline.load(Ordering::Relaxed) {
            return Err(SwError::NetworkError("offline".to_string()));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| FetchResponse::ok("generic response")))
    }
}

async fn timed_fetch(
    worker: &OfflineWorker,
    perf: &PerfTiming,
    op: &'static str,
    url: &str,
) -> Result<FetchResponse, SwError> {
    let request = FetchRequest::get(url)?;
    let start = Instant::now();
    let response = worker.handle_fetch(&request).await;
    perf.record(op, start.elapsed());
    info!(
        url,
        status = response.status.as_u16(),
        from_cache = response.from_cache,
        "fetch"
    );
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), SwError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WorkerConfig::default();
    let cache = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(DemoNetwork::serving(&config)?);
    let worker = OfflineWorker::new(config.clone(), cache.clone(), network.clone());
    let perf = PerfTiming::new();

    // Leftover bucket from a previous deployment.
    cache.open("likhlo-cache-v1.9.0").await?;
    worker
        .register_client("tab-1", config.resolve("/dashboard.html")?)
        .await;

    // Install + activate.
    let start = Instant::now();
    worker.handle_install().await?;
    perf.record("install", start.elapsed());

    let start = Instant::now();
    worker.handle_activate().await?;
    perf.record("activate", start.elapsed());

    // Online: precached asset (cache hit), an uncached page (miss, then
    // cached), and an auth call (network-only).
    let dashboard = config.resolve("/dashboard.html")?;
    let hit = timed_fetch(&worker, &perf, "fetch_cached", dashboard.as_str()).await?;
    assert!(hit.from_cache, "precached asset must be a cache hit");

    timed_fetch(&worker, &perf, "fetch_uncached", "https://likhlo.app/help.html").await?;
    timed_fetch(
        &worker,
        &perf,
        "fetch_network_only",
        "https://identitytoolkit.googleapis.com/v1/token",
    )
    .await?;

    // Control channel: cache one more page on demand.
    worker
        .handle_message(json!({ "type": "CACHE_URLS", "urls": ["/about.html"] }))
        .await?;

    // Offline window: cached pages still serve, everything else degrades.
    network.set_offline(true);
    let offline_hit = timed_fetch(&worker, &perf, "offline_cached", dashboard.as_str()).await?;
    assert!(offline_hit.from_cache);

    let offline_miss =
        timed_fetch(&worker, &perf, "offline_uncached", "https://likhlo.app/new.html").await?;
    assert_eq!(offline_miss.status, StatusCode::SERVICE_UNAVAILABLE);

    let offline_auth = timed_fetch(
        &worker,
        &perf,
        "offline_network_only",
        "https://identitytoolkit.googleapis.com/v1/token",
    )
    .await?;
    assert_eq!(offline_auth.status, StatusCode::REQUEST_TIMEOUT);

    let bucket = config.bucket_name();
    let summary = json!({
        "bucket": bucket,
        "buckets": cache.keys().await,
        "cached_urls": cache.urls(&bucket).await.len(),
        "controlled_clients": worker.controlled_clients().await,
        "network_calls": network.calls(),
        "timings": perf.summary(),
    });
    println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());

    Ok(())
}
