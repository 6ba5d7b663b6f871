//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend selection and the stores handlers call
//! - `routes/`: HTTP routes + handlers (one file per catalog area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .nest("/api/v1", routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
