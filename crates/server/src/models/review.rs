//! Product review model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use seagrape_core::{ProductId, ReviewId, UserId};

/// A product review.
///
/// `verified_purchase` is stamped at creation from the existence of a
/// non-cancelled order containing the product.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i32,
    pub comment: Option<String>,
    pub verified_purchase: bool,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}
