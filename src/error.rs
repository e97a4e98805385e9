//! API error type shared by every handler.
//!
//! Each variant maps to one status code and a `{error, message}` body.
//! Store and media-host failures are logged in full and reported to the
//! client without their internal detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::{models::ValidationError, StoreError};
use crate::media::MediaError;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("media host error: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Database(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Config(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, message) = match self {
            ApiError::BadRequest(msg) => ("Bad request".to_string(), Some(msg.clone())),
            ApiError::Validation(e) => (
                "Validation failed".to_string(),
                Some(format!("{} {}", e.field, e.message)),
            ),
            ApiError::NotFound(entity) => (format!("{} not found", entity), None),
            ApiError::Forbidden => ("Forbidden".to_string(), None),
            ApiError::Unauthorized(msg) => ("Unauthorized".to_string(), Some(msg.clone())),
            ApiError::PayloadTooLarge => (
                "Payload too large".to_string(),
                Some("Uploaded file exceeds the size limit".to_string()),
            ),
            ApiError::Upstream(_) => ("Media upload failed".to_string(), None),
            ApiError::Database(_) | ApiError::Config(_) | ApiError::Internal(_) => {
                ("Internal server error".to_string(), None)
            }
        };
        ErrorResponse { error, message }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => ApiError::BadRequest(msg),
            StoreError::Database(e) => ApiError::Database(e.to_string()),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Rejected(msg) => ApiError::BadRequest(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, "Request failed: {}", self);
        } else {
            tracing::debug!(status = %status, "Request rejected: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, ErrorResponse) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_forbidden_body_is_uniform() {
        let (status, body) = body_of(ApiError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "Forbidden");
        assert!(body.message.is_none());
    }

    #[tokio::test]
    async fn test_database_detail_is_not_echoed() {
        let (status, body) = body_of(ApiError::Database(
            "relation \"gallery_items\" does not exist".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        assert!(body.message.is_none());
    }

    #[tokio::test]
    async fn test_upstream_detail_is_not_echoed() {
        let (status, body) = body_of(ApiError::Upstream("api_secret mismatch".to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.error.contains("api_secret"));
    }

    #[tokio::test]
    async fn test_validation_names_the_field() {
        let (status, body) = body_of(ValidationError::new("userName", "is required").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message.as_deref(), Some("userName is required"));
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ApiError::NotFound("Blog post").status(), StatusCode::NOT_FOUND);
    }
}
