//! Ibhayi Pharmacy Server - pharmacy management platform API
//!
//! This library provides the core functionality of the Ibhayi HTTP server:
//! role-scoped endpoints for managers, pharmacists, and customers covering
//! prescriptions, dispensing, stock control, and reporting.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod server;
pub mod services;
pub mod storage;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use error::*;
pub use server::{IbhayiServer, ServerConfig};

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: IbhayiServer) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
