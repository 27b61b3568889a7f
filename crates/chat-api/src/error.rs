//! Error types for the chat API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use messaging::{ErrorKind, MessageId, MessagingError};
use thiserror::Error;

use crate::response::{ApiResponse, ErrorBody};

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Chat core error.
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Messaging(err) => {
                let kind = err.kind();
                let status = match kind {
                    ErrorKind::BadInput => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                    ErrorKind::Inconsistent => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, kind.as_str())
            }
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, ErrorKind::BadInput.as_str()),
        }
    }

    fn message_id(&self) -> Option<MessageId> {
        match self {
            ApiError::Messaging(MessagingError::BuddyIndexStale { message_id, .. }) => {
                Some(*message_id)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        if status.is_server_error() {
            tracing::error!(kind, "Request failed: {}", self);
        } else {
            tracing::debug!(kind, "Request rejected: {}", self);
        }

        let body: ApiResponse<()> = ApiResponse::Error {
            error: ErrorBody {
                kind,
                message: self.to_string(),
                message_id: self.message_id(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
