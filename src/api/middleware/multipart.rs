use crate::api::error::AppError;
use crate::utils::validation::is_multipart_content_type;
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Reject upload routes before any body is read unless the request is multipart
pub async fn require_multipart(req: Request, next: Next) -> Response {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    if !is_multipart_content_type(content_type) {
        tracing::debug!(
            content_type = content_type.unwrap_or("<missing>"),
            path = %req.uri().path(),
            "Rejected non-multipart upload"
        );
        return AppError::UnsupportedContentType.into_response();
    }

    next.run(req).await
}
