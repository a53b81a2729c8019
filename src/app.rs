use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer};

use crate::config::{ObservabilityConfig, ServerConfig};
use crate::handlers::{
    create_api_router, health_check, metrics_handler, request_validation_middleware,
    security_headers_middleware, HealthState,
};
use crate::observability::{observability_middleware, Metrics};
use crate::services::{PetService, UploadService};

/// Build the application router.
///
/// Request stages, outermost first: observability, CORS, request validation,
/// security headers, then the route handler. Paths that match no route are
/// served from the upload directory.
pub fn create_app(
    server: &ServerConfig,
    observability: &ObservabilityConfig,
    metrics: Arc<Metrics>,
    pet_service: Arc<PetService>,
    upload_service: Arc<UploadService>,
) -> Router {
    let metrics_for_middleware = metrics.clone();
    let max_request_size = server.max_request_size;
    let static_files = ServeDir::new(upload_service.store().dir());
    let health = Arc::new(HealthState::from(observability));

    Router::new()
        .route("/health/status", get(health_check).with_state(health))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(create_api_router(pet_service, upload_service))
        .fallback_service(static_files)
        // Order matters - inner to outer
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(move |req, next| {
            request_validation_middleware(max_request_size, req, next)
        }))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
