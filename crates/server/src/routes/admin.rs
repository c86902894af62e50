//! Administrator route handlers.
//!
//! Order status transitions are administrator-driven; nothing
//! self-transitions. Restock is the only stock increment path.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use seagrape_core::{OrderId, OrderStatus, ProductId};

use crate::db::{OrderRepository, ProductRepository};
use crate::error::{ApiError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Status update payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

/// Restock payload.
#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: i32,
}

/// `PUT /api/admin/orders/{id}/status` - drive the order state machine.
///
/// A tracking number may be attached at or after the `processing -> shipped`
/// transition; it never overwrites an existing one with nothing.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.0.id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(order_id): Path<OrderId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    let order = OrderRepository::new(state.pool())
        .update_status(order_id, request.status, request.tracking_number.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "Order status updated successfully",
        "order": order,
    })))
}

/// `POST /api/admin/products/{id}/restock` - increment stock.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.0.id))]
pub async fn restock_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(product_id): Path<ProductId>,
    Json(request): Json<RestockRequest>,
) -> Result<Json<Value>> {
    if request.quantity < 1 {
        return Err(ApiError::BadRequest(
            "restock quantity must be at least 1".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .restock(product_id, request.quantity)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(json!({
        "message": "Product restocked successfully",
        "product": product,
    })))
}
