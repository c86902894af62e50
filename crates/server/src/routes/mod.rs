//! HTTP route handlers for the Seagrape API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Products (public)
//! GET  /api/products                    - Active product listing
//! GET  /api/products/{id}               - Product detail
//! GET  /api/products/{id}/reviews       - Product reviews
//! POST /api/products/{id}/reviews       - Add review (auth; buyers only)
//!
//! # Cart (auth; these are the endpoints the offline queue replays)
//! GET    /api/cart                      - Cart lines with totals
//! POST   /api/cart/add                  - Add item
//! PUT    /api/cart/update/{id}          - Set item quantity
//! DELETE /api/cart/remove/{id}          - Remove item
//! DELETE /api/cart/clear                - Clear cart
//!
//! # Orders (auth; checkout requires a live connection)
//! POST /api/orders/create               - Atomic order commit
//! GET  /api/orders                      - Order history (paginated)
//! GET  /api/orders/{id}                 - Order detail with items
//!
//! # Admin (admin auth)
//! PUT  /api/admin/orders/{id}/status    - Order status transition
//! POST /api/admin/products/{id}/restock - Increment stock
//! ```

pub mod admin;
pub mod cart;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::state::AppState;

/// Common `?page=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Page number, clamped to at least 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, defaulting to 10, clamped to 1..=100.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update/{id}", put(cart::update))
        .route("/remove/{id}", delete(cart::remove))
        .route("/clear", delete(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(orders::create))
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(reviews::index).post(reviews::create),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/status", put(admin::update_order_status))
        .route("/products/{id}/restock", post(admin::restock_product))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
}

#[cfg(test)]
mod tests {
    use super::PageQuery;

    #[test]
    fn test_page_query_defaults() {
        let query = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_page_query_clamps() {
        let query = PageQuery {
            page: Some(-3),
            limit: Some(10_000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 100);
    }
}
