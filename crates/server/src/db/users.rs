//! User repository.
//!
//! Authentication is an external collaborator: tokens are issued elsewhere,
//! this repository only resolves a presented bearer token to a user.

use sqlx::PgPool;

use crate::models::User;

use super::RepositoryError;

/// Repository for user lookups.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a bearer token to its user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_api_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, is_admin
            FROM users
            WHERE api_token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }
}
