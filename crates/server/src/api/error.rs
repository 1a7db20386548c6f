//! API error type: every failure leaves the server as `{"error": message}`.

use agora_core::debate::DebateError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

pub type ApiResult<T> = Result<T, ApiError>;

/// API error with HTTP status code
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Error body
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 Not Found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("Resource not found: {}", resource.into()),
        )
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<DebateError> for ApiError {
    fn from(err: DebateError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(kind = err.kind(), error = %err, "Debate request failed");
        } else {
            tracing::warn!(kind = err.kind(), error = %err, "Debate request aborted");
        }
        Self::new(status, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{:#}", err), "Request failed");
        Self::internal(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::debate::GenerationFailure;

    #[test]
    fn test_debate_errors_keep_their_status() {
        let rate_limited = ApiError::from(DebateError::from(GenerationFailure::from_status(429, "")));
        assert_eq!(rate_limited.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rate_limited.message, "Rate limit exceeded. Please try again later.");

        let payment = ApiError::from(DebateError::from(GenerationFailure::from_status(402, "")));
        assert_eq!(payment.status, StatusCode::PAYMENT_REQUIRED);

        let validation = ApiError::from(DebateError::Validation("Missing required fields: x".into()));
        assert_eq!(validation.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(validation.message, "Missing required fields: x");
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("idea abc");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "[404 Not Found] Resource not found: idea abc");
    }
}
