//! Scripted storefront backend for end-to-end engine tests.
//!
//! Implements [`HttpBackend`] over an in-memory cart, so replayed mutations
//! have observable effects: an add increments a product's quantity, an
//! update sets it, remove and clear delete rows. GET routes serve canned
//! responses. The whole thing can be flipped offline.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use http::{Method, StatusCode};
use seagrape_sync::{FetchResponse, HttpBackend, NetworkError, OutboundRequest};

/// In-memory cart state: product id -> quantity.
#[derive(Debug, Default)]
pub struct CartState {
    pub quantities: BTreeMap<i64, i64>,
}

/// A scripted storefront reachable through [`HttpBackend`].
#[derive(Default)]
pub struct FakeStorefront {
    online: AtomicBool,
    cart: Mutex<CartState>,
    routes: Mutex<HashMap<String, FetchResponse>>,
    calls: Mutex<Vec<OutboundRequest>>,
}

impl FakeStorefront {
    /// A storefront that is reachable.
    #[must_use]
    pub fn online() -> Self {
        let backend = Self::default();
        backend.online.store(true, Ordering::SeqCst);
        backend
    }

    /// A storefront that is unreachable until [`Self::set_online`].
    #[must_use]
    pub fn offline() -> Self {
        Self::default()
    }

    /// Flip connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Serve a canned response for a GET url.
    pub fn route(&self, url: &str, response: FetchResponse) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.to_string(), response);
    }

    /// Every request that reached the network, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Current cart quantity for a product (0 if absent).
    #[must_use]
    pub fn quantity(&self, product_id: i64) -> i64 {
        self.cart
            .lock()
            .expect("cart lock")
            .quantities
            .get(&product_id)
            .copied()
            .unwrap_or(0)
    }

    fn ok() -> FetchResponse {
        FetchResponse::ok("application/json", r#"{"message":"ok"}"#)
    }

    fn status(status: StatusCode) -> FetchResponse {
        FetchResponse::network(status, BTreeMap::new(), Vec::new())
    }

    fn apply_mutation(&self, request: &OutboundRequest) -> FetchResponse {
        let path = request.url.as_str();
        let mut cart = self.cart.lock().expect("cart lock");

        if request.method == Method::POST && path == "/api/cart/add" {
            let Some(body) = request
                .body
                .as_deref()
                .and_then(|b| serde_json::from_str::<serde_json::Value>(b).ok())
            else {
                return Self::status(StatusCode::BAD_REQUEST);
            };
            let (Some(product), Some(quantity)) =
                (body["productId"].as_i64(), body["quantity"].as_i64())
            else {
                return Self::status(StatusCode::BAD_REQUEST);
            };
            *cart.quantities.entry(product).or_insert(0) += quantity;
            return Self::ok();
        }

        if request.method == Method::PUT
            && let Some(id) = path.strip_prefix("/api/cart/update/")
        {
            let (Ok(product), Some(quantity)) = (
                id.parse::<i64>(),
                request
                    .body
                    .as_deref()
                    .and_then(|b| serde_json::from_str::<serde_json::Value>(b).ok())
                    .and_then(|body| body["quantity"].as_i64()),
            ) else {
                return Self::status(StatusCode::BAD_REQUEST);
            };
            cart.quantities.insert(product, quantity);
            return Self::ok();
        }

        if request.method == Method::DELETE
            && let Some(id) = path.strip_prefix("/api/cart/remove/")
        {
            if let Ok(product) = id.parse::<i64>() {
                cart.quantities.remove(&product);
                return Self::ok();
            }
            return Self::status(StatusCode::BAD_REQUEST);
        }

        if request.method == Method::DELETE && path == "/api/cart/clear" {
            cart.quantities.clear();
            return Self::ok();
        }

        Self::status(StatusCode::NOT_FOUND)
    }
}

impl HttpBackend for FakeStorefront {
    async fn execute(&self, request: &OutboundRequest) -> Result<FetchResponse, NetworkError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable(None));
        }
        self.calls.lock().expect("calls lock").push(request.clone());

        if request.method == Method::GET {
            return Ok(self
                .routes
                .lock()
                .expect("routes lock")
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| Self::status(StatusCode::NOT_FOUND)));
        }

        Ok(self.apply_mutation(request))
    }
}
