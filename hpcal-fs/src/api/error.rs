//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Message sent for every 500; details stay in the server log
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors surfaced to HTTP clients as `{"error": message}`
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or out-of-range request parameters
    BadRequest(String),
    /// Optional backend not configured
    Unavailable(String),
    /// Store failure or other server-side problem; logged, not returned
    Internal(String),
}

impl From<hpcal_common::Error> for ApiError {
    fn from(e: hpcal_common::Error) -> Self {
        match e {
            hpcal_common::Error::InvalidInput(_) => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
