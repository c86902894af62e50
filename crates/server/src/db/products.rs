//! Product repository.

use sqlx::PgPool;

use seagrape_core::ProductId;

use crate::models::Product;

use super::RepositoryError;

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, image_url, stock_quantity,
                   is_active, created_at, updated_at
            FROM products
            WHERE is_active = TRUE
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// One active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, image_url, stock_quantity,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = $1 AND is_active = TRUE
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Increment stock by `quantity` (the restock path - the only stock
    /// mutation besides order commit). Returns the updated product, or
    /// `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn restock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            UPDATE products
            SET stock_quantity = stock_quantity + $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, description, price, image_url, stock_quantity,
                      is_active, created_at, updated_at
            ",
        )
        .bind(quantity)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }
}
