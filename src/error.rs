use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::bidding::BidError;
use crate::store::StoreError;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business-rule rejections (bad bids, duplicate reviews, empty carts)
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what.to_string()),
            StoreError::VersionConflict => AppError::Conflict(err.to_string()),
            StoreError::BidTooLow { .. }
            | StoreError::InsufficientStock { .. }
            | StoreError::EmptyCart
            | StoreError::DuplicateReview
            | StoreError::NotActive
            | StoreError::NotAnAuction => AppError::Rejected(err.to_string()),
        }
    }
}

impl From<BidError> for AppError {
    fn from(err: BidError) -> Self {
        match err {
            BidError::ProductNotFound => AppError::NotFound("product".to_string()),
            BidError::BidderNotFound => AppError::NotFound("customer".to_string()),
            BidError::Rejected(rejection) => AppError::Rejected(rejection.to_string()),
            BidError::Contention { .. } => AppError::Conflict(err.to_string()),
            BidError::Store(inner) => inner.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
