//! Database row models and response shapes.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

use serde::Serialize;

pub use cart::{CartLine, CartSummary};
pub use order::{Order, OrderDetail, OrderItemDetail, OrderSummary};
pub use product::Product;
pub use review::Review;
pub use user::User;

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    /// Build a pagination block; `pages` rounds up.
    #[must_use]
    pub const fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}
