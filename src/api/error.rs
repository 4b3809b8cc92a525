use crate::api::response::ResponseFormatter;
use crate::utils::validation::ValidationError;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please try again later.";
pub const MULTIPART_REQUIRED_MESSAGE: &str = "Content-Type must be multipart/form-data";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Content-Type must be multipart/form-data")]
    UnsupportedContentType,

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error("{public_message}")]
    Upstream {
        public_message: String,
        source: anyhow::Error,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.message)
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnsupportedContentType => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Write the error as an envelope. 5xx detail exposure follows the formatter.
    pub fn render(self, formatter: &ResponseFormatter) -> Response {
        match self {
            AppError::Validation(msg) => formatter.validation_error(&msg, None),
            AppError::UnsupportedContentType => {
                formatter.validation_error(MULTIPART_REQUIRED_MESSAGE, None)
            }
            AppError::PayloadTooLarge(msg) => {
                formatter.error(&msg, StatusCode::PAYLOAD_TOO_LARGE, None)
            }
            AppError::RateLimited { retry_after_secs } => {
                let mut response =
                    formatter.error(RATE_LIMIT_MESSAGE, StatusCode::TOO_MANY_REQUESTS, None);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            AppError::Upstream {
                public_message,
                source,
            } => formatter.internal_error(&source, &public_message),
            AppError::Internal(e) => formatter.internal_error(&e, "Internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.render(&ResponseFormatter::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiagnosticsMode;
    use anyhow::anyhow;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RateLimited { retry_after_secs: 1 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::Internal(anyhow!("x")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_upstream_renders_public_message() {
        let formatter = ResponseFormatter::new(DiagnosticsMode::Production);
        let response = AppError::Upstream {
            public_message: "Failed to generate content".to_string(),
            source: anyhow!("quota exceeded"),
        }
        .render(&formatter);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: AppError = ValidationError {
            code: "PROMPT_EMPTY",
            message: "Prompt cannot be empty".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Prompt cannot be empty");
    }
}
