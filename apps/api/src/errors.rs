use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::IngestError;
use crate::resume::document::DocumentError;
use crate::store::StoreError;
use crate::upstream::UpstreamError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Document(e) => {
                let (status, code) = match e {
                    DocumentError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    DocumentError::GroupNotFound(_) => (StatusCode::NOT_FOUND, "GROUP_NOT_FOUND"),
                    DocumentError::ProtectedContactField(_) => {
                        (StatusCode::CONFLICT, "PROTECTED_FIELD")
                    }
                    DocumentError::NotABullet { .. }
                    | DocumentError::IndexOutOfRange { .. }
                    | DocumentError::InvalidDragKey(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_EDIT")
                    }
                };
                (status, code, e.to_string())
            }
            AppError::Ingest(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INGEST_FAILED",
                e.to_string(),
            ),
            AppError::Upstream(UpstreamError::Blocked { status }) => (
                StatusCode::FAILED_DEPENDENCY,
                "UPSTREAM_BLOCKED",
                format!(
                    "The service refused the request (status {status}); \
                     provide the content another way"
                ),
            ),
            AppError::Upstream(UpstreamError::Archive(msg)) => {
                tracing::error!("Archive error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Upstream(e) => {
                tracing::warn!("Upstream error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_FAILED",
                    "The upstream service failed; try again or paste the content manually"
                        .to_string(),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Snapshot store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
