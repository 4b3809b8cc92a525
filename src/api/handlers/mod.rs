pub mod file_types;
pub mod generate;
pub mod health;

use crate::AppState;
use axum::{extract::State, response::Response};

pub async fn route_not_found(State(state): State<AppState>) -> Response {
    state.responder.not_found(Some("Route not found"))
}
