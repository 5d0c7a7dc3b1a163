use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::api::ApiError;

/// Errors a page hands back to the front-end.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, retry) = match &self {
            PageError::Api(ApiError::NotFound(_)) => (StatusCode::NOT_FOUND, false),
            PageError::Api(ApiError::Unsupported(_)) => (StatusCode::NOT_IMPLEMENTED, false),
            PageError::Api(e) => {
                warn!("Movie API request failed: {}", e);
                (StatusCode::BAD_GATEWAY, true)
            }
            PageError::NotFound(_) => (StatusCode::NOT_FOUND, false),
            PageError::BadRequest(_) => (StatusCode::BAD_REQUEST, false),
            PageError::Conflict(_) => (StatusCode::CONFLICT, true),
        };

        (status, Json(json!({ "error": self.to_string(), "retry": retry }))).into_response()
    }
}

pub type PageResult<T> = Result<T, PageError>;
