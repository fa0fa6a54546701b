pub mod api;
pub mod health;
pub mod metrics;

pub use api::*;
pub use health::*;
pub use metrics::*;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::config::ServerConfig;
use crate::observability::{observability_middleware, Metrics};
use crate::services::PetService;

/// Build the application router with every route and middleware layer
pub fn create_app(
    pet_service: Arc<PetService>,
    metrics: Arc<Metrics>,
    server: &ServerConfig,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    let api_state = ApiState {
        pet_service,
        metrics,
    };

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health/status", get(health_check))
        .route("/api/pets", get(list_pets).post(create_pet))
        .route(
            "/api/pets/:id",
            get(get_pet).put(update_pet).delete(delete_pet),
        )
        .with_state(api_state)
        // Layers run outer to inner from the bottom up
        .layer(DefaultBodyLimit::max(server.max_request_size))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
