//! Cart models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use seagrape_core::{CartItemId, Price, ProductId, UserId};

/// One cart row joined with its product.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub item_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// The cart as returned by `GET /api/cart`.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub total: Price,
    pub count: usize,
}

impl CartSummary {
    /// Summarize cart lines: total is the sum of line totals.
    #[must_use]
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let total = items.iter().map(|line| line.item_total).sum();
        let count = items.len();
        Self {
            items,
            total: Price::usd(total),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: i32, quantity: i32, price: Decimal) -> CartLine {
        CartLine {
            id: CartItemId::new(product),
            user_id: UserId::new(1),
            product_id: ProductId::new(product),
            quantity,
            name: format!("Product {product}"),
            price,
            image_url: None,
            stock_quantity: 10,
            item_total: price * Decimal::from(quantity),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_totals_lines() {
        let summary = CartSummary::from_lines(vec![
            line(1, 2, Decimal::new(1000, 2)), // 2 x 10.00
            line(2, 1, Decimal::new(550, 2)),  // 1 x 5.50
        ]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total.amount, Decimal::new(2550, 2));
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = CartSummary::from_lines(Vec::new());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total.amount, Decimal::ZERO);
    }
}
