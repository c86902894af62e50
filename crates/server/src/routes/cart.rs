//! Cart route handlers.
//!
//! These are the endpoints the offline mutation queue replays, so they are
//! deliberately safe to retry: add folds into the existing row, update sets
//! an absolute quantity, remove and clear are naturally idempotent at the
//! HTTP level.

use axum::{Json, extract::Path, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use seagrape_core::{CartItemId, ProductId};

use crate::db::CartRepository;
use crate::error::{ApiError, Result};
use crate::middleware::RequireUser;
use crate::models::CartSummary;
use crate::state::AppState;

/// Add to cart payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Update quantity payload.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

fn require_positive(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(ApiError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// `GET /api/cart` - the user's cart with line and grand totals.
#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn show(
    State(state): State<AppState>,
    user: RequireUser,
) -> Result<Json<CartSummary>> {
    let lines = CartRepository::new(state.pool()).lines(user.0.id).await?;
    Ok(Json(CartSummary::from_lines(lines)))
}

/// `POST /api/cart/add` - add a product to the cart.
#[instrument(skip(state, user, request), fields(user_id = %user.0.id))]
pub async fn add(
    State(state): State<AppState>,
    user: RequireUser,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<Value>> {
    require_positive(request.quantity)?;

    CartRepository::new(state.pool())
        .add_item(user.0.id, request.product_id, request.quantity)
        .await?;

    Ok(Json(json!({ "message": "Item added to cart" })))
}

/// `PUT /api/cart/update/{id}` - set a cart item's quantity.
#[instrument(skip(state, user, request), fields(user_id = %user.0.id))]
pub async fn update(
    State(state): State<AppState>,
    user: RequireUser,
    Path(item_id): Path<CartItemId>,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<Value>> {
    require_positive(request.quantity)?;

    CartRepository::new(state.pool())
        .update_quantity(user.0.id, item_id, request.quantity)
        .await?;

    Ok(Json(json!({ "message": "Cart updated" })))
}

/// `DELETE /api/cart/remove/{id}` - remove one cart item.
#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn remove(
    State(state): State<AppState>,
    user: RequireUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Value>> {
    CartRepository::new(state.pool())
        .remove(user.0.id, item_id)
        .await?;

    Ok(Json(json!({ "message": "Item removed from cart" })))
}

/// `DELETE /api/cart/clear` - remove every cart row for the user.
#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn clear(State(state): State<AppState>, user: RequireUser) -> Result<Json<Value>> {
    CartRepository::new(state.pool()).clear(user.0.id).await?;

    Ok(Json(json!({ "message": "Cart cleared" })))
}
