use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::{error, instrument};

use super::api::ApiState;

/// Health check endpoint handler
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<ApiState>) -> Result<Json<Value>, StatusCode> {
    let pets = state.pet_service.count_pets().await.map_err(|e| {
        error!("Health check failed to count pets: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "pets": pets,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
