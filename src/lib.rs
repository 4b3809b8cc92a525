pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::response::ResponseFormatter;
use crate::config::GatewayConfig;
use crate::services::file_types;
use crate::services::file_validator::FileValidator;
use crate::services::generation::GenerationService;
use crate::services::generative::GenerativeClient;
use crate::services::rate_limiter::RateLimiter;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Headroom on top of the largest file ceiling for multipart framing and text fields
pub const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::file_types::list_file_types,
        api::handlers::generate::generate_text,
        api::handlers::generate::generate_from_image,
        api::handlers::generate::generate_from_document,
        api::handlers::generate::generate_from_audio,
        api::handlers::generate::generate_from_video,
    ),
    components(
        schemas(
            models::ResponseEnvelope,
            models::GenerateTextRequest,
            models::GenerateFromFileForm,
            models::FileCategory,
            models::FileTypeInfo,
            models::FileMetadata,
            models::HealthData,
            models::MemoryUsage,
        )
    ),
    tags(
        (name = "system", description = "Health and capability discovery"),
        (name = "generate", description = "Prompt and file based generation")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub generation: GenerationService,
    pub rate_limiter: RateLimiter,
    pub responder: ResponseFormatter,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: GatewayConfig, client: Arc<dyn GenerativeClient>) -> Self {
        let rate_limiter =
            RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window);
        Self::with_rate_limiter(config, client, rate_limiter)
    }

    pub fn with_rate_limiter(
        config: GatewayConfig,
        client: Arc<dyn GenerativeClient>,
        rate_limiter: RateLimiter,
    ) -> Self {
        let validator = FileValidator::new(config.verify_file_signatures);
        Self {
            generation: GenerationService::new(client, validator),
            rate_limiter,
            responder: ResponseFormatter::new(config.diagnostics),
            started_at: Utc::now(),
            config: Arc::new(config),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let upload_limit = file_types::largest_max_size() as usize + MULTIPART_OVERHEAD;

    let file_routes = Router::new()
        .route(
            "/generate-from-image",
            post(api::handlers::generate::generate_from_image),
        )
        .route(
            "/generate-from-document",
            post(api::handlers::generate::generate_from_document),
        )
        .route(
            "/generate-from-audio",
            post(api::handlers::generate::generate_from_audio),
        )
        .route(
            "/generate-from-video",
            post(api::handlers::generate::generate_from_video),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .route_layer(from_fn(api::middleware::multipart::require_multipart));

    let routes = Router::new()
        .route("/health", get(api::handlers::health::health_check))
        .route("/file-types", get(api::handlers::file_types::list_file_types))
        .route(
            "/generate-text",
            post(api::handlers::generate::generate_text),
        )
        .merge(file_routes)
        .layer(from_fn(api::middleware::sanitize::sanitize_json_body))
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::rate_limit::rate_limit_middleware,
        ));

    let prefix = state.config.api_prefix.clone();
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&prefix, routes)
    };

    app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(api::handlers::route_not_found)
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
