//! Authentication extractors.
//!
//! Token issuance is an external collaborator; these extractors only resolve
//! `Authorization: Bearer <token>` against `users.api_token`. The offline
//! queue replays requests with their original headers, so a queued mutation
//! authenticates exactly like a live one.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::db::UserRepository;
use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("hello {}", user.email)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires an authenticated administrator.
pub struct RequireAdmin(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let token =
        bearer_token(parts).ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

    UserRepository::new(state.pool())
        .find_by_api_token(token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid token".into()))
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::Forbidden);
        }
        Ok(Self(user))
    }
}
