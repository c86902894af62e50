//! Order commit coordinator.
//!
//! `commit` converts a cart into an order as a single atomic unit: snapshot
//! the cart, validate stock, total the snapshot prices, persist the order
//! header and items, decrement inventory, and clear the cart. Any failure
//! rolls back everything - no partial order, no partial stock decrement, no
//! partially cleared cart.
//!
//! Concurrency: the stock decrement is a conditional update
//! (`... AND stock_quantity >= $n`), so concurrent commits against the same
//! product serialize on the row without a separate locking step; a commit
//! that loses the race sees zero rows affected and aborts. A commit that
//! cannot acquire its row locks within the configured interval aborts with
//! a transient error instead of hanging (`SET LOCAL lock_timeout`).

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::{info, instrument};

use seagrape_core::{Address, AddressError, OrderStatus, ProductId, UserId};

use crate::models::Order;

/// `PostgreSQL` SQLSTATE for `lock_not_available` (lock_timeout exceeded).
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Error from an order commit. Everything here means the transaction rolled
/// back with no side effects.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The shipping address is missing a required field.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line asks for more than the available stock.
    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    /// Row locks could not be acquired within the configured interval;
    /// transient, safe to retry.
    #[error("order could not be committed due to contention; please retry")]
    Contention,

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.code().as_deref() == Some(LOCK_NOT_AVAILABLE)
        {
            return Self::Contention;
        }
        Self::Database(e)
    }
}

/// One cart line snapshotted at transaction start.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct SnapshotLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

/// The validated write set of a commit: what to insert and decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    pub lines: Vec<SnapshotLine>,
    pub total_amount: Decimal,
}

impl CommitPlan {
    /// Validate a cart snapshot and total it at snapshot prices.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty snapshot, or
    /// [`CheckoutError::InsufficientStock`] naming the first product whose
    /// requested quantity exceeds its available stock.
    pub fn build(snapshot: Vec<SnapshotLine>) -> Result<Self, CheckoutError> {
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        for line in &snapshot {
            if line.quantity > line.stock_quantity {
                return Err(CheckoutError::InsufficientStock {
                    product: line.name.clone(),
                });
            }
        }

        let total_amount = snapshot
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();

        Ok(Self {
            lines: snapshot,
            total_amount,
        })
    }
}

/// The order commit coordinator.
#[derive(Clone)]
pub struct CheckoutService {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl CheckoutService {
    /// Create a coordinator over a pool with a row-lock wait budget.
    #[must_use]
    pub const fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }

    /// Atomically convert the user's cart into an order.
    ///
    /// On success the cart is empty and the order is durably visible with
    /// status `processing`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`]; in every error case the transaction has
    /// rolled back and nothing was written.
    #[instrument(skip(self, shipping_address, billing_address), fields(%user_id))]
    pub async fn commit(
        &self,
        user_id: UserId,
        shipping_address: &Address,
        billing_address: Option<&Address>,
    ) -> Result<Order, CheckoutError> {
        shipping_address.validate()?;

        let mut tx = self.pool.begin().await?;

        // Bounded lock waits: abort and roll back rather than hang.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout_ms
        ))
        .execute(&mut *tx)
        .await?;

        let snapshot = sqlx::query_as::<_, SnapshotLine>(
            r"
            SELECT ci.product_id, ci.quantity, p.name, p.price, p.stock_quantity
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1 AND p.is_active = TRUE
            ORDER BY ci.product_id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let plan = CommitPlan::build(snapshot)?;

        let order_number = generate_order_number();
        let tracking_number = generate_tracking_number();

        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders
                (user_id, order_number, status, total_amount,
                 shipping_address, billing_address, tracking_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, order_number, status, total_amount,
                      shipping_address, billing_address, tracking_number,
                      created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&order_number)
        .bind(OrderStatus::Processing)
        .bind(plan.total_amount)
        .bind(sqlx::types::Json(shipping_address.clone()))
        .bind(billing_address.map(|a| sqlx::types::Json(a.clone())))
        .bind(&tracking_number)
        .fetch_one(&mut *tx)
        .await?;

        for line in &plan.lines {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;

            // Conditional decrement: a concurrent commit that already took
            // the stock leaves zero rows to update, and the whole commit
            // rolls back.
            let decremented = sqlx::query(
                r"
                UPDATE products
                SET stock_quantity = stock_quantity - $1, updated_at = NOW()
                WHERE id = $2 AND stock_quantity >= $1
                ",
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                return Err(CheckoutError::InsufficientStock {
                    product: line.name.clone(),
                });
            }
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order committed"
        );
        Ok(order)
    }
}

/// Generate an order number: last six digits of the millisecond clock plus
/// six characters of random entropy. Uniqueness is additionally enforced by
/// the database constraint.
#[must_use]
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().rem_euclid(1_000_000);
    format!("ORD-{millis:06}{}", random_upper_alphanumeric(6))
}

/// Generate a tracking number: `TRK` plus thirteen characters of entropy.
#[must_use]
pub fn generate_tracking_number() -> String {
    format!("TRK{}", random_upper_alphanumeric(13))
}

fn random_upper_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}
