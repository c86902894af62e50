//! Review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use seagrape_core::ProductId;

use crate::db::ReviewRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Pagination;
use crate::routes::PageQuery;
use crate::state::AppState;

/// Create review payload.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

/// `GET /api/products/{id}/reviews` - a product's reviews, paginated.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = (query.page(), query.limit());
    let (reviews, total) = ReviewRepository::new(state.pool())
        .list_for_product(product_id, page, limit)
        .await?;

    Ok(Json(json!({
        "reviews": reviews,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// `POST /api/products/{id}/reviews` - add a review (buyers only; the
/// verified-purchase flag is stamped from order history).
#[instrument(skip(state, user, request), fields(user_id = %user.0.id))]
pub async fn create(
    State(state): State<AppState>,
    user: RequireUser,
    Path(product_id): Path<ProductId>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let review = ReviewRepository::new(state.pool())
        .create(
            user.0.id,
            product_id,
            request.rating,
            request.comment.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Review added successfully",
            "review": review,
        })),
    ))
}
