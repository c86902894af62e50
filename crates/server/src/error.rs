//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ApiError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, ApiError>`. Bodies are JSON `{"message": ...}` so the offline
//! client can surface them directly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use seagrape_core::address::REQUIRED_ADDRESS_FIELDS;

use crate::db::{CartError, OrderError, RepositoryError, ReviewError};
use crate::services::CheckoutError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart mutation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Order read or transition failed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Review operation failed.
    #[error(transparent)]
    Review(#[from] ReviewError),

    /// Order commit failed (transaction rolled back).
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Admin access required.
    #[error("Admin access required")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(err) => match err {
                CartError::ProductNotFound | CartError::ItemNotFound => StatusCode::NOT_FOUND,
                CartError::InsufficientStock => StatusCode::BAD_REQUEST,
                CartError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                OrderError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Review(err) => match err {
                ReviewError::ProductNotFound => StatusCode::NOT_FOUND,
                ReviewError::AlreadyReviewed | ReviewError::InvalidRating => {
                    StatusCode::BAD_REQUEST
                }
                ReviewError::NotPurchased => StatusCode::FORBIDDEN,
                ReviewError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::Address(_)
                | CheckoutError::EmptyCart
                | CheckoutError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::Contention => StatusCode::SERVICE_UNAVAILABLE,
                CheckoutError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> serde_json::Value {
        // Don't expose internal error details to clients.
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            return json!({ "message": "Server error" });
        }

        // Address validation reports the full required-field list so clients
        // can highlight the form without another round trip.
        if let Self::Checkout(CheckoutError::Address(_)) = self {
            return json!({
                "message": "Missing required shipping address fields",
                "required": REQUIRED_ADDRESS_FIELDS,
            });
        }

        json!({ "message": self.to_string() })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry before responding.
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seagrape_core::AddressError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Cart(CartError::InsufficientStock).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Checkout(CheckoutError::EmptyCart).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Checkout(CheckoutError::Contention).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Review(ReviewError::NotPurchased).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = ApiError::Internal("connection pool exhausted".into());
        assert_eq!(err.body()["message"], "Server error");
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let err = ApiError::Checkout(CheckoutError::InsufficientStock {
            product: "Tide Jar".into(),
        });
        assert_eq!(err.body()["message"], "Insufficient stock for Tide Jar");
    }

    #[test]
    fn test_address_error_lists_required_fields() {
        let err = ApiError::Checkout(CheckoutError::Address(AddressError::MissingField("city")));
        let body = err.body();
        assert_eq!(body["message"], "Missing required shipping address fields");
        let required = body["required"].as_array().unwrap();
        assert_eq!(required.len(), 6);
    }
}
