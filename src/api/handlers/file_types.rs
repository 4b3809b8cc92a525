use crate::AppState;
use crate::services::file_types;
use axum::{extract::State, response::Response};

#[utoipa::path(
    get,
    path = "/api/file-types",
    responses(
        (status = 200, description = "Accepted upload categories with size ceilings and MIME types", body = crate::models::ResponseEnvelope),
        (status = 500, description = "File types could not be listed", body = crate::models::ResponseEnvelope)
    ),
    tag = "system"
)]
pub async fn list_file_types(State(state): State<AppState>) -> Response {
    // success() reports serialization failures as a 500 envelope
    state.responder.ok(
        file_types::describe_all(),
        "Supported file types retrieved successfully",
    )
}
