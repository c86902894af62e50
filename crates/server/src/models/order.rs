//! Order models.
//!
//! Orders are immutable once created: the total, the line prices, and the
//! address snapshots are fixed at commit time. Only `status` and
//! `tracking_number` change afterwards, through the administrator routes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use sqlx::types::Json;

use seagrape_core::{Address, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// An order header row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: Json<Address>,
    pub billing_address: Option<Json<Address>>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order row for list views, with its item count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub tracking_number: Option<String>,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// An order item joined with its product, price snapshotted at purchase.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItemDetail {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
    pub name: String,
    pub image_url: Option<String>,
}

/// A full order with its items, as returned by `GET /api/orders/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}
