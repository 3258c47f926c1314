use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use herptrack_db::StoreError;

/// The four failure classes a client can tell apart, plus an opaque 500.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any store call; names the violated field.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate value or a concurrent-update race; the client should
    /// re-fetch and retry.
    #[error("{0}")]
    Conflict(String),

    /// Deliberately generic; never reveals which credential check failed.
    #[error("authentication failed")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Duplicate(field) => ApiError::Conflict(format!("{field} already exists")),
            StoreError::Conflict => {
                ApiError::Conflict("record was modified concurrently, re-fetch and retry".into())
            }
            other => ApiError::Internal(other.into()),
        }
    }
}

pub(crate) fn join_error(err: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(anyhow::anyhow!("blocking task join error: {err}"))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{what} not found") }),
            ),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "error": message })),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "authentication failed" }),
            ),
            ApiError::Internal(err) => {
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
