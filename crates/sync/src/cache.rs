//! Named, versioned buckets of cached responses.
//!
//! A bucket is an independently lifecycled partition of cached responses,
//! identified by a name that embeds a deployment version tag. Activation
//! purges every bucket whose name is not in the current known set,
//! reclaiming storage from superseded deployments.
//!
//! Population is observable only through subsequent lookups; there is no
//! invalidation signal. Staleness is bounded by whichever strategy populated
//! the entry.

use std::collections::HashMap;

use http::Method;
use moka::future::Cache;
use tokio::sync::RwLock;

use crate::request::RequestIdentity;
use crate::response::FetchResponse;

/// Cached entries kept per bucket before size-based eviction.
const DEFAULT_BUCKET_CAPACITY: u64 = 1024;

type Bucket = Cache<RequestIdentity, FetchResponse>;

/// The three bucket names of one deployment version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketNames {
    pub shell: String,
    pub api: String,
    pub image: String,
}

impl BucketNames {
    /// Bucket names for an app prefix and version tag, e.g.
    /// `seagrape-v3`, `seagrape-api-v3`, `seagrape-images-v3`.
    #[must_use]
    pub fn versioned(app: &str, version: &str) -> Self {
        Self {
            shell: format!("{app}-{version}"),
            api: format!("{app}-api-{version}"),
            image: format!("{app}-images-{version}"),
        }
    }

    /// The known set used by [`ResourceCache::activate`].
    #[must_use]
    pub fn known_set(&self) -> Vec<String> {
        vec![self.shell.clone(), self.api.clone(), self.image.clone()]
    }
}

/// A set of named response caches with bucket-level lifecycle.
///
/// Service object: construct one per engine instance and inject it into the
/// router; tests construct fresh instances per case.
pub struct ResourceCache {
    buckets: RwLock<HashMap<String, Bucket>>,
    capacity: u64,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    /// Create an empty cache with the default per-bucket capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUCKET_CAPACITY)
    }

    /// Create an empty cache with an explicit per-bucket capacity.
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Open (create if absent) a bucket by name.
    pub async fn open(&self, name: &str) {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(name.to_string())
            .or_insert_with(|| Cache::builder().max_capacity(self.capacity).build());
    }

    /// Look up a cached response. Absent bucket or entry yields `None`.
    ///
    /// A hit is returned with its source stamped as cache; no network is
    /// ever touched.
    pub async fn lookup(
        &self,
        bucket: &str,
        identity: &RequestIdentity,
    ) -> Option<FetchResponse> {
        let bucket = self.buckets.read().await.get(bucket).cloned()?;
        bucket.get(identity).await.map(FetchResponse::into_cached)
    }

    /// Store a response under a request identity, creating the bucket if
    /// needed. Non-GET identities are never cached and are ignored.
    pub async fn put(&self, bucket: &str, identity: RequestIdentity, response: FetchResponse) {
        if identity.method != Method::GET {
            tracing::debug!(%identity, "refusing to cache non-GET response");
            return;
        }
        self.open(bucket).await;
        let handle = self.buckets.read().await.get(bucket).cloned();
        if let Some(handle) = handle {
            handle.insert(identity, response).await;
        }
    }

    /// Delete a bucket and everything in it. Returns whether it existed.
    pub async fn purge(&self, name: &str) -> bool {
        let removed = self.buckets.write().await.remove(name);
        match removed {
            Some(bucket) => {
                bucket.invalidate_all();
                true
            }
            None => false,
        }
    }

    /// Activate a deployment: open every bucket in `known` and purge every
    /// bucket whose name is not in `known`.
    pub async fn activate(&self, known: &[String]) {
        let mut buckets = self.buckets.write().await;

        let stale: Vec<String> = buckets
            .keys()
            .filter(|name| !known.iter().any(|k| k == *name))
            .cloned()
            .collect();
        for name in stale {
            if let Some(bucket) = buckets.remove(&name) {
                bucket.invalidate_all();
                tracing::info!(bucket = %name, "purged stale cache bucket");
            }
        }

        for name in known {
            buckets
                .entry(name.clone())
                .or_insert_with(|| Cache::builder().max_capacity(self.capacity).build());
        }
    }

    /// Names of all currently open buckets, sorted.
    pub async fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_lookup_roundtrip() {
        let cache = ResourceCache::new();
        let identity = RequestIdentity::get("/api/products");
        cache
            .put("api-v1", identity.clone(), FetchResponse::ok("application/json", "[]"))
            .await;

        let hit = cache.lookup("api-v1", &identity).await.expect("cached entry");
        assert_eq!(hit.body_string(), "[]");
        assert_eq!(hit.source, crate::response::ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_lookup_missing_bucket_is_absent() {
        let cache = ResourceCache::new();
        assert!(
            cache
                .lookup("nope", &RequestIdentity::get("/x"))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_non_get_is_never_cached() {
        let cache = ResourceCache::new();
        let identity = RequestIdentity {
            method: Method::POST,
            url: "/api/cart/add".to_string(),
        };
        cache
            .put("api-v1", identity.clone(), FetchResponse::ok("application/json", "{}"))
            .await;
        assert!(cache.lookup("api-v1", &identity).await.is_none());
    }

    #[tokio::test]
    async fn test_refetch_overwrites_entry() {
        let cache = ResourceCache::new();
        let identity = RequestIdentity::get("/api/products/1");
        cache
            .put("api-v1", identity.clone(), FetchResponse::ok("application/json", "v1"))
            .await;
        cache
            .put("api-v1", identity.clone(), FetchResponse::ok("application/json", "v2"))
            .await;

        let hit = cache.lookup("api-v1", &identity).await.expect("cached entry");
        assert_eq!(hit.body_string(), "v2");
    }

    #[tokio::test]
    async fn test_purge_removes_bucket() {
        let cache = ResourceCache::new();
        let identity = RequestIdentity::get("/a");
        cache
            .put("shell-v2", identity.clone(), FetchResponse::ok("text/html", "x"))
            .await;

        assert!(cache.purge("shell-v2").await);
        assert!(!cache.purge("shell-v2").await);
        assert!(cache.lookup("shell-v2", &identity).await.is_none());
    }

    #[tokio::test]
    async fn test_activate_purges_unknown_buckets() {
        let cache = ResourceCache::new();
        let old = BucketNames::versioned("seagrape", "v2");
        let new = BucketNames::versioned("seagrape", "v3");
        cache.activate(&old.known_set()).await;
        cache
            .put(
                &old.shell,
                RequestIdentity::get("/"),
                FetchResponse::ok("text/html", "old shell"),
            )
            .await;

        cache.activate(&new.known_set()).await;

        let names = cache.bucket_names().await;
        assert_eq!(
            names,
            vec![
                "seagrape-api-v3".to_string(),
                "seagrape-images-v3".to_string(),
                "seagrape-v3".to_string(),
            ]
        );
        assert!(
            cache
                .lookup(&old.shell, &RequestIdentity::get("/"))
                .await
                .is_none()
        );
    }
}
