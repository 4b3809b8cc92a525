use crate::api::error::AppError;
use crate::utils::validation::sanitize_body;
use axum::{
    body::Body,
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

/// Largest JSON body the sanitizer buffers
pub const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Top-level JSON object after key stripping and trimming. Empty for non-JSON requests.
#[derive(Debug, Clone, Default)]
pub struct SanitizedBody(pub Map<String, Value>);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains(mime::APPLICATION_JSON.essence_str()))
        .unwrap_or(false)
}

/// Runs before any other body processing. The cleaned object is stored as a
/// request extension and also replaces the body bytes.
pub async fn sanitize_json_body(req: Request, next: Next) -> Response {
    if !is_json(&req) {
        let mut req = req;
        req.extensions_mut().insert(SanitizedBody::default());
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, JSON_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::PayloadTooLarge(
                "Request body exceeds the maximum allowed limit".to_string(),
            )
            .into_response();
        }
    };

    let mut map = if bytes.is_empty() {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected malformed JSON body");
                return AppError::Validation("Invalid JSON in request body".to_string())
                    .into_response();
            }
        }
    };

    sanitize_body(&mut map);

    let rewritten = match serde_json::to_vec(&map) {
        Ok(bytes) => bytes,
        Err(e) => return AppError::Internal(e.into()).into_response(),
    };
    parts.extensions.insert(SanitizedBody(map));

    next.run(Request::from_parts(parts, Body::from(rewritten)))
        .await
}
