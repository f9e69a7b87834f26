//! HTTP error envelopes

use crate::tracker::TrackerError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side failures carry `success: false`, client errors only the message
        let body = if status.is_server_error() {
            json!({ "error": self.to_string(), "success": false })
        } else {
            json!({ "error": self.to_string() })
        };
        (status, Json(body)).into_response()
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::MissingFields => ApiError::BadRequest(err.to_string()),
            TrackerError::NotFound => ApiError::NotFound(err.to_string()),
            TrackerError::AlreadyFinished(_) => ApiError::Conflict(err.to_string()),
            TrackerError::AtCapacity => ApiError::Unavailable(err.to_string()),
            TrackerError::Internal(_) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_error_mapping() {
        assert_eq!(ApiError::from(TrackerError::MissingFields).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(TrackerError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(TrackerError::AlreadyFinished("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TrackerError::AtCapacity).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::from(TrackerError::MissingFields).to_string(),
            "Missing required fields: symbol and company_name"
        );
        assert_eq!(ApiError::from(TrackerError::NotFound).to_string(), "Request ID not found");
    }
}
