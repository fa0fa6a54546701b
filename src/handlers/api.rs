use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::models::{Pet, PetFilters, ServiceError};
use crate::observability::Metrics;
use crate::services::PetService;

pub const NOT_FOUND_MESSAGE: &str = "Mascota no encontrada";
pub const REQUIRED_FIELDS_MESSAGE: &str = "Todos los campos son obligatorios";
pub const MALFORMED_BODY_MESSAGE: &str = "El cuerpo de la solicitud no es JSON válido";
pub const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "El cuerpo de la solicitud es demasiado grande";

/// Shared application state
#[derive(Clone)]
pub struct ApiState {
    pub pet_service: Arc<PetService>,
    pub metrics: Arc<Metrics>,
}

/// Query parameters for listing pets
#[derive(Debug, Default, Deserialize)]
pub struct ListPetsQuery {
    pub raza: Option<String>,
    pub tipo: Option<String>,
}

type ApiError = (StatusCode, Json<Value>);

/// List pets, optionally filtered by `raza` and `tipo`
#[instrument(name = "list_pets", skip(state), fields(
    raza = query.raza.as_deref(),
    tipo = query.tipo.as_deref(),
))]
pub async fn list_pets(
    State(state): State<ApiState>,
    Query(query): Query<ListPetsQuery>,
) -> Result<Json<Vec<Pet>>, ApiError> {
    match state.pet_service.list_pets(query_to_filters(query)).await {
        Ok(pets) => Ok(Json(pets)),
        Err(err) => {
            error!("Failed to list pets: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a specific pet by ID
#[instrument(name = "get_pet", skip(state), fields(pet_id = %id))]
pub async fn get_pet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Pet>, ApiError> {
    state
        .pet_service
        .get_pet(&id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Create a new pet
#[instrument(name = "create_pet", skip(state, body))]
pub async fn create_pet(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Pet>), ApiError> {
    let Json(body) = body.map_err(rejection_to_response)?;

    match state.pet_service.create_pet(body).await {
        Ok(pet) => {
            crate::info_with_trace!(pet_id = pet.id, "Successfully created pet");
            Ok((StatusCode::CREATED, Json(pet)))
        }
        Err(err) => Err(service_error_to_response(err)),
    }
}

/// Shallow-merge the body into an existing pet
#[instrument(name = "update_pet", skip(state, body), fields(pet_id = %id))]
pub async fn update_pet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Pet>, ApiError> {
    let Json(body) = body.map_err(rejection_to_response)?;

    state
        .pet_service
        .update_pet(&id, body)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Delete a pet. The body is an array holding the removed record.
#[instrument(name = "delete_pet", skip(state), fields(pet_id = %id))]
pub async fn delete_pet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Pet>>, ApiError> {
    state
        .pet_service
        .delete_pet(&id)
        .await
        .map(|pet| Json(vec![pet]))
        .map_err(service_error_to_response)
}

/// Convert query parameters to PetFilters. Empty values impose no constraint.
fn query_to_filters(query: ListPetsQuery) -> PetFilters {
    PetFilters {
        raza: query.raza.filter(|raza| !raza.is_empty()),
        tipo: query.tipo.filter(|tipo| !tipo.is_empty()),
    }
}

pub(crate) fn message(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "message": message })))
}

fn rejection_to_response(rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => {
            message(StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE_MESSAGE)
        }
        _ => message(StatusCode::BAD_REQUEST, MALFORMED_BODY_MESSAGE),
    }
}

/// Convert ServiceError to HTTP response
fn service_error_to_response(err: ServiceError) -> ApiError {
    match err {
        ServiceError::PetNotFound { .. } => message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
        ServiceError::ValidationError { message: detail } => {
            warn!("Validation failed: {}", detail);
            message(StatusCode::BAD_REQUEST, REQUIRED_FIELDS_MESSAGE)
        }
        ServiceError::Repository { source } => {
            error!("Repository failure: {}", source);
            message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}
