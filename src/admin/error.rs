//! JSON error responses for the admin API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::GatewayError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Error returned by admin handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Missing or invalid API key")
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let (status, code) = match &err {
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::Conflict(_) => (StatusCode::CONFLICT, "domain_exists"),
            GatewayError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            GatewayError::InvalidName(_) => (StatusCode::BAD_REQUEST, "invalid_domain"),
            GatewayError::NotVerified(_) => (StatusCode::BAD_REQUEST, "not_verified"),
            GatewayError::NotCustom(_) => (StatusCode::BAD_REQUEST, "not_custom"),
            GatewayError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
            GatewayError::Proxy(_) => (StatusCode::SERVICE_UNAVAILABLE, "proxy_unavailable"),
            GatewayError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        // Internal details stay in the log.
        let message = if status.is_server_error() {
            tracing::error!(error = %err, "Admin request failed");
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            err.to_string()
        };

        Self::new(status, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}
