//! HTTP middleware: CORS, request timing, and the authentication extractor.

pub mod auth_context;

pub use auth_context::{AuthContext, Role};

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Permissive CORS for the API frontends.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = elapsed.as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}
