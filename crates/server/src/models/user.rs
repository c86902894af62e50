//! User model (authentication boundary only).
//!
//! Token issuance is an external collaborator; the server only validates a
//! presented bearer token against `users.api_token`.

use serde::Serialize;
use sqlx::FromRow;

use seagrape_core::UserId;

/// An authenticated user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
}
