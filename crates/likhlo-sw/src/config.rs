//! Worker configuration.
//!
//! All configuration is immutable and injected at worker construction. A
//! cache-version bump corresponds to deploying a new worker, never to
//! mutating a running one.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::SwError;

/// Offline worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Origin the worker is scoped to; manifest paths resolve against it.
    pub scope: Url,

    /// Cache version. Bump on every static-asset change to force a refresh.
    pub cache_version: String,

    /// Prefix for cache bucket names.
    pub cache_prefix: String,

    /// Static assets precached during install, available offline afterwards.
    pub static_assets: Vec<String>,

    /// URL substrings that must always bypass the cache, in both directions.
    pub network_only: Vec<String>,
}

impl WorkerConfig {
    /// Name of the current version's cache bucket.
    pub fn bucket_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Resolve a manifest path or URL against the worker scope.
    pub fn resolve(&self, path: &str) -> Result<Url, SwError> {
        self.scope
            .join(path)
            .map_err(|e| SwError::InvalidUrl(format!("{path}: {e}")))
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            scope: Url::parse("https://likhlo.app/").expect("static scope URL"),
            cache_version: "v2.0.1".to_string(),
            cache_prefix: "likhlo-cache".to_string(),
            static_assets: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/signup.html".to_string(),
                "/reset.html".to_string(),
                "/dashboard.html".to_string(),
                "/css/style.css".to_string(),
                "/js/auth.js".to_string(),
                "/js/firebase-config.js".to_string(),
                "/js/notes.js".to_string(),
                "/js/utils.js".to_string(),
                "/public/config.js".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
                "/manifest.json".to_string(),
            ],
            network_only: vec![
                "firebasestorage.googleapis.com".to_string(),
                "firebaseapp.com".to_string(),
                "googleapis.com".to_string(),
                "gstatic.com".to_string(),
                "identitytoolkit.googleapis.com".to_string(),
            ],
        }
    }
}
