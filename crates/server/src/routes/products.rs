//! Product route handlers (public reads).
//!
//! These are the GET endpoints the interception layer caches network-first,
//! so they stay renderable from cache when the network drops.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use seagrape_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// `GET /api/products` - all active products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool()).list_active().await?;
    Ok(Json(json!({ "products": products })))
}

/// `GET /api/products/{id}` - one active product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Value>> {
    let product = ProductRepository::new(state.pool())
        .get_active(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(json!({ "product": product })))
}
