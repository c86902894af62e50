//! Order route handlers.
//!
//! Checkout always requires a live connection: `create` invokes the order
//! commit coordinator directly and is never queued for offline replay.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use seagrape_core::{Address, OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Pagination;
use crate::routes::PageQuery;
use crate::state::AppState;

/// `POST /api/orders/create` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
}

/// The order block of a successful create response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: OrderId,
    pub order_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

/// `POST /api/orders/create` - atomically convert the cart into an order.
#[instrument(skip(state, user, request), fields(user_id = %user.0.id))]
pub async fn create(
    State(state): State<AppState>,
    user: RequireUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let order = state
        .checkout()
        .commit(
            user.0.id,
            &request.shipping_address,
            request.billing_address.as_ref(),
        )
        .await?;

    let created = CreatedOrder {
        id: order.id,
        order_number: order.order_number,
        total_amount: order.total_amount,
        status: order.status,
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Order created successfully",
            "order": created,
        })),
    ))
}

/// `GET /api/orders` - the user's order history, paginated.
#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn index(
    State(state): State<AppState>,
    user: RequireUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = (query.page(), query.limit());
    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_user(user.0.id, page, limit)
        .await?;

    Ok(Json(json!({
        "orders": orders,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// `GET /api/orders/{id}` - one of the user's orders with its items.
#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn show(
    State(state): State<AppState>,
    user: RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Value>> {
    let detail = OrderRepository::new(state.pool())
        .get_for_user(user.0.id, order_id)
        .await?;

    Ok(Json(json!({ "order": detail })))
}
