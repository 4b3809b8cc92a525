use crate::AppState;
use crate::api::error::AppError;
use crate::services::rate_limiter::RateDecision;
use crate::utils::client_ip::extract_client_ip;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

static LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Client identity resolved by the rate limiter, available to handlers
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = extract_client_ip(req.headers(), peer.as_ref(), state.config.trust_proxy);

    match state.rate_limiter.check(&client_ip) {
        RateDecision::Allowed { remaining } => {
            req.extensions_mut().insert(ClientIp(client_ip));
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(
                LIMIT_HEADER.clone(),
                HeaderValue::from(state.rate_limiter.max_requests()),
            );
            headers.insert(REMAINING_HEADER.clone(), HeaderValue::from(remaining));
            response
        }
        RateDecision::Limited { retry_after } => {
            tracing::warn!(
                client_ip = %client_ip,
                path = %req.uri().path(),
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            // Round up so clients never retry inside the current window
            let retry_after_secs = retry_after.as_millis().div_ceil(1000) as u64;
            AppError::RateLimited { retry_after_secs }.render(&state.responder)
        }
    }
}
