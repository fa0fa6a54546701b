use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, instrument};

use super::api::{message, ApiState, INTERNAL_ERROR_MESSAGE};

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus scrape endpoint. The stored-pets gauge is resynced from the
/// store on every scrape.
#[instrument(name = "metrics_handler", skip(state))]
pub async fn metrics_handler(State(state): State<ApiState>) -> Response {
    match state.pet_service.count_pets().await {
        Ok(count) => state.metrics.set_pets_stored(count),
        Err(e) => error!(error = %e, "Failed to count pets for scrape"),
    }

    state
        .metrics
        .encode()
        .map(|exposition| {
            (
                [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
                exposition,
            )
                .into_response()
        })
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to encode metrics");
            message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
        })
}
