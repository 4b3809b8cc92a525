use crate::AppState;
use crate::services::health::gather_health;
use axum::{extract::State, response::Response};

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Process uptime and memory usage", body = crate::models::ResponseEnvelope),
        (status = 500, description = "Health data could not be gathered", body = crate::models::ResponseEnvelope)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    match gather_health(state.started_at) {
        Ok(health) => state.responder.ok(health, "Service is healthy"),
        Err(e) => state.responder.internal_error(&e, "Health check failed"),
    }
}
