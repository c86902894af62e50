//! Product catalog model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use seagrape_core::ProductId;

/// A catalog product.
///
/// `stock_quantity` is mutated only by order commit (decrement) and restock
/// (increment); the schema enforces that it never goes negative.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
