//! Tagged response envelope shared by every endpoint.

use messaging::MessageId;
use serde::Serialize;

/// Either a success payload or a structured error.
///
/// Serialized as `{"status":"ok","data":...}` or
/// `{"status":"error","error":{"kind":...,"message":...}}`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Ok { data: T },
    Error { error: ErrorBody },
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse::Ok { data }
    }
}

/// Error details returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error class.
    pub kind: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Id of a message that was saved despite the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
}
