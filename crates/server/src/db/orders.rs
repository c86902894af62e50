//! Order repository.
//!
//! Order creation lives in the checkout service (it is a multi-table
//! transaction); this repository covers reads and the administrator-driven
//! status transitions.

use sqlx::PgPool;
use thiserror::Error;

use seagrape_core::{OrderId, OrderStatus, UserId};

use crate::models::{Order, OrderDetail, OrderItemDetail, OrderSummary};

/// Error from an order operation.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order does not exist (or belongs to another user).
    #[error("Order not found")]
    NotFound,

    /// The requested status change is not a legal transition.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

const ORDER_COLUMNS: &str = r"
    id, user_id, order_number, status, total_amount,
    shipping_address, billing_address, tracking_number,
    created_at, updated_at
";

/// Repository for order reads and status transitions.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of the user's orders, newest first, with item counts.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<OrderSummary>, i64), OrderError> {
        let offset = (page - 1) * limit;

        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.order_number, o.status, o.total_amount, o.tracking_number,
                   COALESCE(i.item_count, 0) AS item_count,
                   o.created_at
            FROM orders o
            LEFT JOIN (
                SELECT order_id, COUNT(*) AS item_count
                FROM order_items
                GROUP BY order_id
            ) i ON i.order_id = o.id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok((orders, total))
    }

    /// One of the user's orders with its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist or belongs
    /// to another user.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderDetail, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        let items = self.items(order_id).await?;
        Ok(OrderDetail { order, items })
    }

    /// The items of an order, joined with product name and image.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItemDetail>, OrderError> {
        let items = sqlx::query_as::<_, OrderItemDetail>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
                   p.name, p.image_url
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Administrator-driven status transition, with optional tracking number
    /// attachment.
    ///
    /// The current status is read under a row lock and the transition is
    /// validated against the state machine before the update, so concurrent
    /// administrators cannot race an order into an illegal state.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown orders and
    /// `OrderError::InvalidTransition` for illegal moves.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(OrderStatus,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((current,)) = current else {
            return Err(OrderError::NotFound);
        };
        if !current.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET status = $1,
                tracking_number = COALESCE($2, tracking_number),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(next)
        .bind(tracking_number)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }
}
