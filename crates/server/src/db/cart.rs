//! Cart repository.
//!
//! One row per `(user, product)`: adding a product already in the cart folds
//! into the existing row's quantity. Stock is checked against the requested
//! quantity at mutation time; the authoritative check happens again inside
//! the order commit transaction.

use sqlx::PgPool;
use thiserror::Error;

use seagrape_core::{CartItemId, ProductId, UserId};

use crate::models::CartLine;

/// Error from a cart mutation.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist or is inactive.
    #[error("Product not found")]
    ProductNotFound,

    /// The requested quantity exceeds available stock.
    #[error("Insufficient stock")]
    InsufficientStock,

    /// The cart item does not exist or belongs to another user.
    #[error("Cart item not found")]
    ItemNotFound,

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository for the server-owned cart.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart lines joined with product data, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id, ci.user_id, ci.product_id, ci.quantity,
                   p.name, p.price, p.image_url, p.stock_quantity,
                   (ci.quantity * p.price) AS item_total,
                   ci.created_at
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1 AND p.is_active = TRUE
            ORDER BY ci.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add `quantity` of a product, folding into an existing row if present.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for unknown or inactive products
    /// and `CartError::InsufficientStock` if the resulting quantity exceeds
    /// available stock.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), CartError> {
        let product: Option<(i32,)> = sqlx::query_as(
            "SELECT stock_quantity FROM products WHERE id = $1 AND is_active = TRUE",
        )
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        let Some((stock_quantity,)) = product else {
            return Err(CartError::ProductNotFound);
        };
        if quantity > stock_quantity {
            return Err(CartError::InsufficientStock);
        }

        let existing: Option<(CartItemId, i32)> = sqlx::query_as(
            "SELECT id, quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        match existing {
            Some((item_id, current)) => {
                let new_quantity = current + quantity;
                if new_quantity > stock_quantity {
                    return Err(CartError::InsufficientStock);
                }
                sqlx::query(
                    "UPDATE cart_items SET quantity = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(new_quantity)
                .bind(item_id)
                .execute(self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)",
                )
                .bind(user_id)
                .bind(product_id)
                .bind(quantity)
                .execute(self.pool)
                .await?;
            }
        }

        Ok(())
    }

    /// Set the quantity of one cart item ("set to N", not "increment": the
    /// offline queue may replay this, and setting is safe to retry).
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the item is missing or owned by
    /// another user, `CartError::InsufficientStock` if over stock.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), CartError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"
            SELECT p.stock_quantity
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.id = $1 AND ci.user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some((stock_quantity,)) = row else {
            return Err(CartError::ItemNotFound);
        };
        if quantity > stock_quantity {
            return Err(CartError::InsufficientStock);
        }

        sqlx::query("UPDATE cart_items SET quantity = $1, updated_at = NOW() WHERE id = $2")
            .bind(quantity)
            .bind(item_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Remove one cart item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if nothing was deleted.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<(), CartError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CartError::ItemNotFound);
        }
        Ok(())
    }

    /// Remove every cart row for the user.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
