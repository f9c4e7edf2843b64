use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

/// Application error with a stable machine-readable code per variant.
/// Staff-facing REST paths surface these as `{success:false, message, code}`;
/// the citizen-facing webhook adapters never let them escape as-is.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("A proof photo is required to resolve this ticket")]
    PhotoRequired,

    #[error("Photo URL host is not allowed: {0}")]
    PhotoHostNotAllowed(String),

    #[error("Ticket is not resolved yet")]
    NotResolved,

    #[error("Ticket has already been rated")]
    AlreadyRated,

    #[error("Rating must be an integer between 1 and 5")]
    InvalidRating,

    #[error("Feedback exceeds the maximum length")]
    FeedbackTooLong,

    #[error("OTP does not match")]
    OtpMismatch,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("OTP was requested too recently")]
    OtpCooldown { wait_seconds: i64 },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    /// Stable code surfaced to API clients. These are part of the wire
    /// contract; renaming one is a breaking change.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidPhone(_) => "INVALID_PHONE",
            AppError::PhotoRequired => "PHOTO_REQUIRED",
            AppError::PhotoHostNotAllowed(_) => "PHOTO_HOST_NOT_ALLOWED",
            AppError::NotResolved => "NOT_RESOLVED",
            AppError::AlreadyRated => "ALREADY_RATED",
            AppError::InvalidRating => "INVALID_RATING",
            AppError::FeedbackTooLong => "FEEDBACK_TOO_LONG",
            AppError::OtpMismatch => "OTP_MISMATCH",
            AppError::OtpExpired => "OTP_EXPIRED",
            AppError::OtpCooldown { .. } => "OTP_COOLDOWN",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::ExternalServiceError(_) => "UPSTREAM_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::InvalidPhone(_)
            | AppError::PhotoRequired
            | AppError::PhotoHostNotAllowed(_)
            | AppError::NotResolved
            | AppError::AlreadyRated
            | AppError::InvalidRating
            | AppError::FeedbackTooLong
            | AppError::OtpMismatch
            | AppError::OtpExpired => StatusCode::BAD_REQUEST,
            AppError::OtpCooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Internals are logged server-side and masked toward clients
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                msg.clone()
            }
            other => other.to_string(),
        };

        // Cooldown responses carry the remaining wait so callers can
        // show a countdown instead of hammering the endpoint.
        if let AppError::OtpCooldown { wait_seconds } = self {
            let body = Json(serde_json::json!({
                "success": false,
                "message": message,
                "code": code,
                "wait_seconds": wait_seconds,
            }));
            return (status, body).into_response();
        }

        let body = Json(ApiResponse::<()>::error(Some(message), Some(code)));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_for_rating_failures() {
        let errors = [
            AppError::NotResolved,
            AppError::AlreadyRated,
            AppError::InvalidRating,
            AppError::FeedbackTooLong,
            AppError::OtpMismatch,
            AppError::OtpExpired,
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn cooldown_is_rate_limited_status() {
        let err = AppError::OtpCooldown { wait_seconds: 42 };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "OTP_COOLDOWN");
    }
}
