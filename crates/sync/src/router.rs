//! Interception layer: per-class caching strategies.
//!
//! The router sits between the application and the network. Every request is
//! classified once ([`classify`]) and dispatched to exactly one strategy:
//!
//! | class      | strategy                                                  |
//! |------------|-----------------------------------------------------------|
//! | Image      | cache-first; failure synthesizes a placeholder graphic    |
//! | Api        | network-first; failure falls back to cache, then offline  |
//! | Navigation | cache-first against the shell; offline document fallback  |
//! | Shell      | cache-first; network fallback with best-effort caching    |
//! | Other      | network-first; failure synthesizes a timeout response     |
//!
//! Offline and cache-miss conditions are absorbed here and converted into
//! either cached data or a synthesized response; they never propagate as
//! errors to application code.

use std::collections::HashSet;
use std::sync::Arc;

use http::StatusCode;
use tracing::{info, instrument, warn};

use crate::cache::{BucketNames, ResourceCache};
use crate::net::{HttpBackend, OutboundRequest};
use crate::request::{FetchRequest, RequestClass, RequestIdentity, classify, normalize_url};
use crate::response::FetchResponse;

/// Static configuration for a router instance.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Bucket names for the current deployment version.
    pub buckets: BucketNames,
    /// Application shell assets precached at install time.
    pub shell_assets: Vec<String>,
    /// The root document served for client-routed navigations.
    pub root_document: String,
    /// The dedicated offline document (must be in `shell_assets` to be
    /// available offline).
    pub offline_document: String,
}

impl RouterConfig {
    /// Config with conventional root (`/`) and offline (`/offline.html`)
    /// documents.
    #[must_use]
    pub fn new(buckets: BucketNames, shell_assets: Vec<String>) -> Self {
        Self {
            buckets,
            shell_assets,
            root_document: "/".to_string(),
            offline_document: "/offline.html".to_string(),
        }
    }
}

/// The request-intercepting proxy.
///
/// Service object with constructor-injected cache and backend; lifecycle is
/// install-then-activate, teardown never. Tests construct fresh instances
/// per case.
pub struct FetchRouter<B> {
    cache: Arc<ResourceCache>,
    backend: Arc<B>,
    config: RouterConfig,
    shell_index: HashSet<String>,
}

impl<B: HttpBackend> FetchRouter<B> {
    /// Create a router over a cache and backend.
    pub fn new(cache: Arc<ResourceCache>, backend: Arc<B>, config: RouterConfig) -> Self {
        let shell_index = config
            .shell_assets
            .iter()
            .map(|asset| normalize_url(asset))
            .collect();
        Self {
            cache,
            backend,
            config,
            shell_index,
        }
    }

    /// The resource cache (shared with the rest of the engine).
    #[must_use]
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Populate the shell bucket opportunistically.
    ///
    /// Each asset is fetched independently; a failure on any single asset is
    /// logged and must not abort the remaining installs. Returns how many
    /// assets were cached.
    #[instrument(skip(self))]
    pub async fn install(&self) -> usize {
        self.cache.open(&self.config.buckets.shell).await;

        let mut cached = 0;
        for asset in &self.config.shell_assets {
            let request = FetchRequest::get(asset.clone());
            match self.backend.execute(&OutboundRequest::from(&request)).await {
                Ok(response) if response.status == StatusCode::OK => {
                    self.cache
                        .put(&self.config.buckets.shell, request.identity(), response)
                        .await;
                    cached += 1;
                }
                Ok(response) => {
                    warn!(asset, status = %response.status, "shell asset rejected; continuing install");
                }
                Err(e) => {
                    warn!(asset, error = %e, "shell asset fetch failed; continuing install");
                }
            }
        }
        info!(
            cached,
            total = self.config.shell_assets.len(),
            "shell install finished"
        );
        cached
    }

    /// Activate this deployment version: open the known buckets and purge
    /// every bucket left over from a superseded deployment.
    #[instrument(skip(self))]
    pub async fn activate(&self) {
        self.cache.activate(&self.config.buckets.known_set()).await;
    }

    /// Serve a request through its class's strategy. Never fails: every
    /// failure mode converts into a cached or synthesized response.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn handle(&self, request: &FetchRequest) -> FetchResponse {
        match classify(request, &self.shell_index) {
            RequestClass::Image => self.image(request).await,
            RequestClass::Api => self.api(request).await,
            RequestClass::Navigation => self.navigation(request).await,
            RequestClass::Shell => self.shell(request).await,
            RequestClass::Other => self.other(request).await,
        }
    }

    /// Cache-first; a hit is served with no network check (staleness is
    /// accepted for images).
    async fn image(&self, request: &FetchRequest) -> FetchResponse {
        let bucket = &self.config.buckets.image;
        let identity = request.identity();

        if request.is_cacheable()
            && let Some(hit) = self.cache.lookup(bucket, &identity).await
        {
            return hit;
        }

        match self.backend.execute(&OutboundRequest::from(request)).await {
            Ok(response) if response.status == StatusCode::OK => {
                if request.is_cacheable() {
                    self.cache.put(bucket, identity, response.clone()).await;
                }
                response
            }
            Ok(response) => response,
            Err(_) => FetchResponse::placeholder_image(),
        }
    }

    /// Network-first with opportunistic caching of successful GET reads.
    async fn api(&self, request: &FetchRequest) -> FetchResponse {
        let bucket = &self.config.buckets.api;
        let identity = request.identity();

        match self.backend.execute(&OutboundRequest::from(request)).await {
            Ok(response) => {
                if request.is_cacheable() && response.status == StatusCode::OK {
                    self.cache
                        .put(bucket, identity, response.clone())
                        .await;
                }
                response
            }
            Err(e) => {
                warn!(error = %e, "api request failed; falling back to cache");
                match self.cache.lookup(bucket, &identity).await {
                    Some(hit) => hit,
                    None => FetchResponse::offline_api(),
                }
            }
        }
    }

    /// Cache-first against the application shell, then the network, then the
    /// offline document, then a minimal synthetic response.
    async fn navigation(&self, request: &FetchRequest) -> FetchResponse {
        let shell = &self.config.buckets.shell;

        if let Some(hit) = self.cache.lookup(shell, &request.identity()).await {
            return hit;
        }

        // Client-side routing: any navigation falls back to the root document.
        let root = RequestIdentity::get(&self.config.root_document);
        if let Some(hit) = self.cache.lookup(shell, &root).await {
            return hit;
        }

        let root_request = FetchRequest::get(self.config.root_document.clone());
        if let Ok(response) = self
            .backend
            .execute(&OutboundRequest::from(&root_request))
            .await
        {
            return response;
        }

        let offline = RequestIdentity::get(&self.config.offline_document);
        match self.cache.lookup(shell, &offline).await {
            Some(hit) => hit,
            None => FetchResponse::offline_page(),
        }
    }

    /// Cache-first for precached shell assets.
    async fn shell(&self, request: &FetchRequest) -> FetchResponse {
        let bucket = &self.config.buckets.shell;
        let identity = request.identity();

        if let Some(hit) = self.cache.lookup(bucket, &identity).await {
            return hit;
        }

        match self.backend.execute(&OutboundRequest::from(request)).await {
            Ok(response) => {
                if request.is_cacheable() && response.status == StatusCode::OK {
                    self.cache.put(bucket, identity, response.clone()).await;
                }
                response
            }
            Err(_) => FetchResponse::request_timeout(),
        }
    }

    /// Network-first with best-effort caching for everything else.
    async fn other(&self, request: &FetchRequest) -> FetchResponse {
        let bucket = &self.config.buckets.shell;
        let identity = request.identity();

        match self.backend.execute(&OutboundRequest::from(request)).await {
            Ok(response) => {
                if request.is_cacheable() && response.status == StatusCode::OK {
                    self.cache.put(bucket, identity, response.clone()).await;
                }
                response
            }
            Err(_) => FetchResponse::request_timeout(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::response::ResponseSource;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct StubBackend {
        online: AtomicBool,
        routes: StdMutex<HashMap<String, FetchResponse>>,
        calls: StdMutex<Vec<String>>,
    }

    impl StubBackend {
        fn online() -> Self {
            let backend = Self::default();
            backend.online.store(true, Ordering::SeqCst);
            backend
        }

        fn offline() -> Self {
            Self::default()
        }

        fn route(&self, url: &str, response: FetchResponse) {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl HttpBackend for StubBackend {
        async fn execute(
            &self,
            request: &OutboundRequest,
        ) -> Result<FetchResponse, NetworkError> {
            self.calls.lock().unwrap().push(request.url.clone());
            if !self.online.load(Ordering::SeqCst) {
                return Err(NetworkError::Unreachable(None));
            }
            Ok(self
                .routes
                .lock()
                .unwrap()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| {
                    FetchResponse::network(
                        StatusCode::NOT_FOUND,
                        std::collections::BTreeMap::new(),
                        b"not found".to_vec(),
                    )
                }))
        }
    }

    fn router_with(backend: StubBackend) -> FetchRouter<StubBackend> {
        let config = RouterConfig::new(
            BucketNames::versioned("seagrape", "v3"),
            vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/offline.html".to_string(),
                "/static/css/main.css".to_string(),
            ],
        );
        FetchRouter::new(
            Arc::new(ResourceCache::new()),
            Arc::new(backend),
            config,
        )
    }

    #[tokio::test]
    async fn test_image_hit_never_touches_network() {
        let router = router_with(StubBackend::online());
        let request = FetchRequest::get("/media/hero.png");
        router
            .cache()
            .put(
                "seagrape-images-v3",
                request.identity(),
                FetchResponse::ok("image/png", "pixels"),
            )
            .await;

        let response = router.handle(&request).await;

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(router.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_image_miss_populates_cache() {
        let backend = StubBackend::online();
        backend.route("/media/hero.png", FetchResponse::ok("image/png", "pixels"));
        let router = router_with(backend);
        let request = FetchRequest::get("/media/hero.png");

        let first = router.handle(&request).await;
        assert_eq!(first.source, ResponseSource::Network);

        let second = router.handle(&request).await;
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(router.backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_image_failure_synthesizes_placeholder() {
        let router = router_with(StubBackend::offline());

        let response = router.handle(&FetchRequest::get("/media/hero.png")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.source, ResponseSource::Synthesized);
        assert!(response.body_string().contains("<svg"));
    }

    #[tokio::test]
    async fn test_api_network_first_caches_reads() {
        let backend = StubBackend::online();
        backend.route("/api/products", FetchResponse::ok("application/json", "[1]"));
        let router = router_with(backend);
        let request = FetchRequest::get("/api/products");

        let live = router.handle(&request).await;
        assert_eq!(live.source, ResponseSource::Network);

        // Network goes away; the cached read is served.
        router.backend.online.store(false, Ordering::SeqCst);
        let cached = router.handle(&request).await;
        assert_eq!(cached.source, ResponseSource::Cache);
        assert_eq!(cached.body_string(), "[1]");
    }

    #[tokio::test]
    async fn test_api_always_attempts_network_even_when_cached() {
        let backend = StubBackend::online();
        backend.route("/api/products", FetchResponse::ok("application/json", "[1]"));
        let router = router_with(backend);
        let request = FetchRequest::get("/api/products");

        router.handle(&request).await;
        router.handle(&request).await;

        assert_eq!(router.backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_api_offline_without_cache_yields_offline_payload() {
        let router = router_with(StubBackend::offline());

        let response = router.handle(&FetchRequest::get("/api/cart")).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(json["offline"], serde_json::Value::Bool(true));
    }

    #[tokio::test]
    async fn test_api_error_status_is_not_cached() {
        let backend = StubBackend::online();
        backend.route(
            "/api/products",
            FetchResponse::network(
                StatusCode::INTERNAL_SERVER_ERROR,
                std::collections::BTreeMap::new(),
                b"boom".to_vec(),
            ),
        );
        let router = router_with(backend);
        let request = FetchRequest::get("/api/products");

        router.handle(&request).await;

        router.backend.online.store(false, Ordering::SeqCst);
        let fallback = router.handle(&request).await;
        // The 500 was never cached, so offline yields the offline payload.
        assert_eq!(fallback.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(fallback.source, ResponseSource::Synthesized);
    }

    #[tokio::test]
    async fn test_navigation_serves_cached_root_for_client_routes() {
        let router = router_with(StubBackend::offline());
        router
            .cache()
            .put(
                "seagrape-v3",
                RequestIdentity::get("/"),
                FetchResponse::ok("text/html", "<html>shell</html>"),
            )
            .await;

        let response = router.handle(&FetchRequest::navigate("/products/7")).await;

        assert_eq!(response.body_string(), "<html>shell</html>");
    }

    #[tokio::test]
    async fn test_navigation_total_failure_serves_offline_document() {
        let router = router_with(StubBackend::offline());
        router
            .cache()
            .put(
                "seagrape-v3",
                RequestIdentity::get("/offline.html"),
                FetchResponse::ok("text/html", "<html>offline</html>"),
            )
            .await;

        let response = router.handle(&FetchRequest::navigate("/checkout")).await;

        assert_eq!(response.body_string(), "<html>offline</html>");
    }

    #[tokio::test]
    async fn test_navigation_last_resort_is_synthetic() {
        let router = router_with(StubBackend::offline());

        let response = router.handle(&FetchRequest::navigate("/")).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.source, ResponseSource::Synthesized);
    }

    #[tokio::test]
    async fn test_install_tolerates_partial_failure() {
        let backend = StubBackend::online();
        backend.route("/", FetchResponse::ok("text/html", "<html>shell</html>"));
        backend.route("/offline.html", FetchResponse::ok("text/html", "offline"));
        backend.route("/static/css/main.css", FetchResponse::ok("text/css", "body{}"));
        // "/index.html" is left unrouted -> 404 -> not cached, not fatal.
        let router = router_with(backend);

        let cached = router.install().await;

        assert_eq!(cached, 3);
        assert!(
            router
                .cache()
                .lookup("seagrape-v3", &RequestIdentity::get("/"))
                .await
                .is_some()
        );
        assert!(
            router
                .cache()
                .lookup("seagrape-v3", &RequestIdentity::get("/index.html"))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_activate_purges_previous_deployment() {
        let router = router_with(StubBackend::online());
        router
            .cache()
            .put(
                "seagrape-v2",
                RequestIdentity::get("/"),
                FetchResponse::ok("text/html", "old"),
            )
            .await;

        router.activate().await;

        let names = router.cache().bucket_names().await;
        assert!(!names.contains(&"seagrape-v2".to_string()));
        assert!(names.contains(&"seagrape-v3".to_string()));
    }

    #[tokio::test]
    async fn test_other_request_failure_is_timeout_class() {
        let router = router_with(StubBackend::offline());

        let response = router.handle(&FetchRequest::get("/robots.txt")).await;

        assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);
    }
}
