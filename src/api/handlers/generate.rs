use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::rate_limit::ClientIp;
use crate::api::middleware::sanitize::SanitizedBody;
use crate::models::{FileCategory, IncomingFile};
use crate::services::file_types;
use crate::services::generation::file_success_message;
use crate::utils::validation::{sanitize_body, validate_prompt};
use axum::{
    Extension,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::Response,
};
use serde_json::{Map, Value};
use tracing::Instrument;

fn client_ip(ext: Option<Extension<ClientIp>>) -> String {
    ext.map(|Extension(ClientIp(ip))| ip)
        .unwrap_or_else(|| "unknown".to_string())
}

#[utoipa::path(
    post,
    path = "/api/generate-text",
    request_body = crate::models::GenerateTextRequest,
    responses(
        (status = 200, description = "Generated text in `data`", body = crate::models::ResponseEnvelope),
        (status = 400, description = "Prompt missing, not a string, empty or too long", body = crate::models::ResponseEnvelope),
        (status = 429, description = "Rate limit exceeded", body = crate::models::ResponseEnvelope),
        (status = 500, description = "Upstream generation failed", body = crate::models::ResponseEnvelope)
    ),
    tag = "generate"
)]
pub async fn generate_text(
    State(state): State<AppState>,
    ip: Option<Extension<ClientIp>>,
    body: Option<Extension<SanitizedBody>>,
) -> Response {
    let formatter = state.responder;
    let mut body = body
        .map(|Extension(SanitizedBody(map))| map)
        .unwrap_or_default();

    if let Err(e) = validate_prompt(&mut body) {
        return AppError::from(e).render(&formatter);
    }

    let span = tracing::info_span!("generate_text", client_ip = %client_ip(ip));
    match state
        .generation
        .generate_text(body.get("prompt"))
        .instrument(span)
        .await
    {
        Ok(text) => formatter.ok(text, "Content generated successfully"),
        Err(e) => e.render(&formatter),
    }
}

macro_rules! file_route {
    ($name:ident, $category:expr, $path:literal, $what:literal) => {
        #[utoipa::path(
            post,
            path = $path,
            request_body(content = crate::models::GenerateFromFileForm, content_type = "multipart/form-data"),
            responses(
                (status = 200, description = "Generated text in `data`, file summary in `meta`", body = crate::models::ResponseEnvelope),
                (status = 400, description = "Invalid prompt, content type or file", body = crate::models::ResponseEnvelope),
                (status = 413, description = "Upload exceeds the transport limit", body = crate::models::ResponseEnvelope),
                (status = 429, description = "Rate limit exceeded", body = crate::models::ResponseEnvelope),
                (status = 500, description = "Upstream generation failed", body = crate::models::ResponseEnvelope)
            ),
            tag = "generate"
        )]
        #[doc = concat!("Generate text from a prompt and an uploaded ", $what, " file")]
        pub async fn $name(
            State(state): State<AppState>,
            ip: Option<Extension<ClientIp>>,
            multipart: Result<Multipart, MultipartRejection>,
        ) -> Response {
            generate_from_file(state, $category, ip, multipart).await
        }
    };
}

file_route!(generate_from_image, FileCategory::Image, "/api/generate-from-image", "image");
file_route!(generate_from_document, FileCategory::Document, "/api/generate-from-document", "document");
file_route!(generate_from_audio, FileCategory::Audio, "/api/generate-from-audio", "audio");
file_route!(generate_from_video, FileCategory::Video, "/api/generate-from-video", "video");

/// Shared flow for every upload category
pub async fn generate_from_file(
    state: AppState,
    category: FileCategory,
    ip: Option<Extension<ClientIp>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let formatter = state.responder;

    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Multipart extraction rejected");
            return AppError::Validation(rejection.body_text()).render(&formatter);
        }
    };

    let (mut fields, file) = match read_form(&mut multipart, category).await {
        Ok(form) => form,
        Err(e) => return e.render(&formatter),
    };

    sanitize_body(&mut fields);
    if let Err(e) = validate_prompt(&mut fields) {
        return AppError::from(e).render(&formatter);
    }

    let span = tracing::info_span!(
        "generate_from_file",
        category = %category,
        client_ip = %client_ip(ip)
    );
    match state
        .generation
        .generate_from_file(fields.get("prompt"), category, file)
        .instrument(span)
        .await
    {
        Ok(result) => {
            let meta = result
                .metadata
                .and_then(|m| serde_json::to_value(m).ok());
            formatter.success(
                result.text,
                &file_success_message(category),
                StatusCode::OK,
                meta,
            )
        }
        Err(e) => e.render(&formatter),
    }
}

/// Collect text fields and the single file part for `category`
async fn read_form(
    multipart: &mut Multipart,
    category: FileCategory,
) -> Result<(Map<String, Value>, Option<IncomingFile>), AppError> {
    let field_name = file_types::spec_for(category).field_name;
    let mut fields = Map::new();
    let mut file: Option<IncomingFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(original_name) => {
                if name != field_name {
                    return Err(AppError::Validation(format!("Unexpected field: {}", name)));
                }
                if file.is_some() {
                    return Err(AppError::Validation(
                        "Only one file may be uploaded per request".to_string(),
                    ));
                }
                let mime_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some(IncomingFile::new(original_name, mime_type, data));
            }
            None => {
                let text = field.text().await.map_err(multipart_error)?;
                fields.insert(name, Value::String(text));
            }
        }
    }

    Ok((fields, file))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

