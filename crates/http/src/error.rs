//! Error handling for the Bookshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JSON body returned for every failed request
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

/// Application error types that map to HTTP responses.
///
/// The `reason` carried by each variant is logged, never rendered; clients
/// only see the canonical message for the status.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {reason}")]
    NotFound { reason: String },

    #[error("unprocessable: {reason}")]
    Unprocessable { reason: String },

    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn unprocessable(reason: impl Into<String>) -> Self {
        Self::Unprocessable {
            reason: reason.into(),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Public message for the status
    pub fn message(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "Not found",
            AppError::Unprocessable { .. } => "Unprocessable",
            AppError::BadRequest { .. } => "Bad request",
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = ?self,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                reason = %self,
                "request rejected"
            );
        }

        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message: self.message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(error: AppError) -> (StatusCode, ErrorBody) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_renders_structured_body() {
        let (status, body) = render(AppError::not_found("book 9 does not exist")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            ErrorBody {
                success: false,
                error: 404,
                message: "Not found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unprocessable_maps_to_422() {
        let (status, body) = render(AppError::unprocessable("missing field `author`")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, 422);
        assert_eq!(body.message, "Unprocessable");
    }

    #[tokio::test]
    async fn bad_request_uses_same_shape() {
        let (status, body) = render(AppError::bad_request("missing field `rating`")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.error, 400);
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let error = AppError::Internal(anyhow::anyhow!("database connection failed"));
        let (status, body) = render(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
    }
}
