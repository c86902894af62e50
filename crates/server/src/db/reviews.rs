//! Review repository.
//!
//! A review's `verified_purchase` flag is derived at creation from the
//! existence of an order containing the product in a purchase-basis status
//! (`processing`, `shipped`, or `delivered` - stock is decremented at
//! commit, not delivery, so `processing` already counts).

use sqlx::PgPool;
use thiserror::Error;

use seagrape_core::{ProductId, UserId};

use crate::models::Review;

/// Error from a review operation.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The product does not exist or is inactive.
    #[error("Product not found")]
    ProductNotFound,

    /// The user already reviewed this product.
    #[error("You have already reviewed this product")]
    AlreadyReviewed,

    /// The user never purchased this product.
    #[error("You can only review products you have purchased")]
    NotPurchased,

    /// Rating outside 1..=5.
    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Database` if a query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Review>, i64), ReviewError> {
        let offset = (page - 1) * limit;

        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT r.id, r.product_id, r.user_id, r.rating, r.comment,
                   r.verified_purchase, u.email AS user_email, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(product_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(self.pool)
            .await?;

        Ok((reviews, total))
    }

    /// Create a review, stamping the verified-purchase flag.
    ///
    /// Only buyers may review: creation is rejected outright when no
    /// qualifying order exists.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating`, `ReviewError::ProductNotFound`,
    /// `ReviewError::AlreadyReviewed`, or `ReviewError::NotPurchased` per
    /// the checks above.
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, ReviewError> {
        if !(1..=5).contains(&rating) {
            return Err(ReviewError::InvalidRating);
        }

        let product_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        if !product_exists {
            return Err(ReviewError::ProductNotFound);
        }

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        if already {
            return Err(ReviewError::AlreadyReviewed);
        }

        let purchased: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM order_items oi
                JOIN orders o ON o.id = oi.order_id
                WHERE o.user_id = $1
                  AND oi.product_id = $2
                  AND o.status IN ('processing', 'shipped', 'delivered')
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        if !purchased {
            return Err(ReviewError::NotPurchased);
        }

        let review = sqlx::query_as::<_, Review>(
            r"
            WITH inserted AS (
                INSERT INTO reviews (user_id, product_id, rating, comment, verified_purchase)
                VALUES ($1, $2, $3, $4, TRUE)
                RETURNING id, product_id, user_id, rating, comment, verified_purchase, created_at
            )
            SELECT i.id, i.product_id, i.user_id, i.rating, i.comment,
                   i.verified_purchase, u.email AS user_email, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;

        Ok(review)
    }
}
