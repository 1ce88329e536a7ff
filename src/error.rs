use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::client::ClientError;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Status { status: 404, .. } => ApiError::NotFound(value.to_string()),
            ClientError::Status {
                status: 400 | 422, ..
            } => ApiError::BadRequest(value.to_string()),
            // 401/403 upstream means our own backend credentials are wrong.
            ClientError::Status { .. } => ApiError::BadGateway(value.to_string()),
            ClientError::Transport(ref err) => {
                error!("Backend transport error: {err}");
                ApiError::BadGateway(value.to_string())
            }
            ClientError::Decode { .. } => {
                error!("{value}");
                ApiError::BadGateway(value.to_string())
            }
            ClientError::Url(_) | ClientError::Header(_) => {
                error!("{value}");
                ApiError::Internal(value.to_string())
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", value.body_text()))
    }
}

// Malformed or mistyped JSON is a form error like any other.
impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", value.body_text()))
    }
}
