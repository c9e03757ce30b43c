//! rgeo Service Library
//!
//! HTTP handlers, router and OpenAPI document for the reverse geocoding service.
//! This library is used by both the rgeo-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use rgeo::GeocodeService;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Geocoding service answering lookups.
    pub geocode_service: GeocodeService,
}

/// OpenAPI documentation for the rgeo service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rgeo Reverse Geocoding Service",
        version = "0.1.0",
        description = "REST API mapping coordinates to the nearest known place from local reference data.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "Pedro Sanz Martinez", url = "https://github.com/pedrosanzmtz/rgeo")
    ),
    paths(
        handlers::get_locate,
        handlers::post_locate,
        handlers::health_check,
        handlers::get_stats,
        handlers::post_reload,
    ),
    components(
        schemas(
            handlers::PlaceResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
            handlers::ReloadResponse,
        )
    ),
    tags(
        (name = "geocoding", description = "Reverse geocoding endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router with docs, tracing and CORS layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/locate",
            get(handlers::get_locate).post(handlers::post_locate),
        )
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .route("/reload", post(handlers::post_reload))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ErrorResponse, HealthResponse, LocateQuery, PlaceResponse, ReloadResponse, StatsResponse,
};
