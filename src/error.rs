use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const TIMEOUT_MESSAGE: &str = "Search timed out. Please try again later.";
pub const UPSTREAM_MESSAGE: &str = "Failed to perform search. Please try again later. If the issue persists, the service might be temporarily blocked or facing a network issue.";
const INTERNAL_MESSAGE: &str = "Internal server error. Please try again later.";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream resolver timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Upstream resolver failed: {0}")]
    Upstream(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::CacheUnavailable(e.to_string())
    }
}

impl AppError {
    /// Whether the caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Timeout(_) | AppError::Upstream(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Detail stays in the logs; callers only get a generic message.
        let (status, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Timeout(_) => {
                tracing::error!(error = %self, retryable = self.is_retryable(), "Search request timed out");
                (StatusCode::INTERNAL_SERVER_ERROR, TIMEOUT_MESSAGE.to_string())
            }
            AppError::Upstream(_) => {
                tracing::error!(error = %self, retryable = self.is_retryable(), "Search request failed upstream");
                (StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_MESSAGE.to_string())
            }
            AppError::CacheUnavailable(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Search request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_invalid_input_is_bad_request() {
        let response = AppError::InvalidInput("Missing 'query' parameter.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_and_upstream_are_server_errors() {
        let timeout = AppError::Timeout(Duration::from_secs(5)).into_response();
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream = AppError::Upstream("HTTP 429".to_string()).into_response();
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(AppError::Upstream("boom".to_string()).is_retryable());
        assert!(!AppError::InvalidInput("empty".to_string()).is_retryable());
    }
}
