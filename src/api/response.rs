use crate::config::DiagnosticsMode;
use crate::models::ResponseEnvelope;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};

/// Shown in place of error details outside development
pub const OPAQUE_INTERNAL_ERROR: &str = "Internal server error";

/// Builds the uniform envelope. Error detail exposure is fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter {
    diagnostics: DiagnosticsMode,
}

impl ResponseFormatter {
    pub fn new(diagnostics: DiagnosticsMode) -> Self {
        Self { diagnostics }
    }

    pub fn success_envelope<T: Serialize>(
        &self,
        data: T,
        message: &str,
        code: StatusCode,
        meta: Option<Value>,
    ) -> ResponseEnvelope {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                return self.internal_error_envelope(
                    &anyhow::Error::new(e).context("Failed to serialize response data"),
                    "Failed to build response",
                );
            }
        };

        ResponseEnvelope {
            status: true,
            code: code.as_u16(),
            message: message.to_string(),
            data: Some(data),
            meta: meta.filter(|m| !m.is_null()),
            errors: None,
            timestamp: now_iso8601(),
        }
    }

    pub fn error_envelope(
        &self,
        message: &str,
        code: StatusCode,
        errors: Option<Value>,
    ) -> ResponseEnvelope {
        ResponseEnvelope {
            status: false,
            code: code.as_u16(),
            message: message.to_string(),
            data: None,
            meta: None,
            errors,
            timestamp: now_iso8601(),
        }
    }

    /// Logs the cause, then builds a 500 envelope with `message` as the public text
    pub fn internal_error_envelope(&self, cause: &anyhow::Error, message: &str) -> ResponseEnvelope {
        tracing::error!(error = ?cause, "{}", message);

        let errors = if self.diagnostics.is_development() {
            json!({
                "message": cause.to_string(),
                "stack": format!("{:?}", cause),
            })
        } else {
            Value::String(OPAQUE_INTERNAL_ERROR.to_string())
        };

        self.error_envelope(message, StatusCode::INTERNAL_SERVER_ERROR, Some(errors))
    }

    pub fn success<T: Serialize>(
        &self,
        data: T,
        message: &str,
        code: StatusCode,
        meta: Option<Value>,
    ) -> Response {
        write(self.success_envelope(data, message, code, meta))
    }

    pub fn ok<T: Serialize>(&self, data: T, message: &str) -> Response {
        self.success(data, message, StatusCode::OK, None)
    }

    pub fn error(&self, message: &str, code: StatusCode, errors: Option<Value>) -> Response {
        write(self.error_envelope(message, code, errors))
    }

    pub fn validation_error(&self, message: &str, errors: Option<Value>) -> Response {
        self.error(message, StatusCode::BAD_REQUEST, errors)
    }

    pub fn internal_error(&self, cause: &anyhow::Error, message: &str) -> Response {
        write(self.internal_error_envelope(cause, message))
    }

    pub fn not_found(&self, message: Option<&str>) -> Response {
        self.error(
            message.unwrap_or("Resource not found"),
            StatusCode::NOT_FOUND,
            None,
        )
    }

    pub fn unauthorized(&self, message: Option<&str>) -> Response {
        self.error(
            message.unwrap_or("Unauthorized access"),
            StatusCode::UNAUTHORIZED,
            None,
        )
    }

    pub fn forbidden(&self, message: Option<&str>) -> Response {
        self.error(
            message.unwrap_or("Access forbidden"),
            StatusCode::FORBIDDEN,
            None,
        )
    }
}

fn write(envelope: ResponseEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
