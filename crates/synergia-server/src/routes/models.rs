//! Model catalogue endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use synergia_domain::{Model, ModelUpdate, NewModel};

use super::{CountResponse, DeletedResponse};
use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EnabledOnlyQuery {
    #[serde(default)]
    pub enabled_only: bool,
}

/// POST /api/v1/models
pub async fn create_model_handler(
    State(state): State<AppState>,
    Json(input): Json<NewModel>,
) -> Result<(StatusCode, Json<Model>), ServerError> {
    let model = state.services.models().create(input)?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// GET /api/v1/models
pub async fn list_models_handler(
    State(state): State<AppState>,
    Query(query): Query<EnabledOnlyQuery>,
) -> Result<Json<Vec<Model>>, ServerError> {
    Ok(Json(state.services.models().list(query.enabled_only)?))
}

/// GET /api/v1/models/enabled
pub async fn list_enabled_models_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Model>>, ServerError> {
    Ok(Json(state.services.models().list_enabled()?))
}

/// GET /api/v1/models/providers
pub async fn list_providers_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ServerError> {
    Ok(Json(state.services.models().list_providers()?))
}

/// GET /api/v1/models/provider/{provider}
pub async fn list_models_by_provider_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<Vec<Model>>, ServerError> {
    Ok(Json(state.services.models().list_by_provider(&provider)?))
}

/// GET /api/v1/models/count
pub async fn count_models_handler(
    State(state): State<AppState>,
    Query(query): Query<EnabledOnlyQuery>,
) -> Result<Json<CountResponse>, ServerError> {
    let count = state.services.models().count(query.enabled_only)?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/v1/models/name/{name}
pub async fn get_model_by_name_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Model>, ServerError> {
    Ok(Json(state.services.models().get_by_name(&name)?))
}

/// GET /api/v1/models/{id}
pub async fn get_model_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Model>, ServerError> {
    Ok(Json(state.services.models().get(id)?))
}

/// PUT /api/v1/models/{id}
pub async fn update_model_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ModelUpdate>,
) -> Result<Json<Model>, ServerError> {
    Ok(Json(state.services.models().update(id, update)?))
}

/// PATCH /api/v1/models/{id}/toggle
pub async fn toggle_model_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Model>, ServerError> {
    Ok(Json(state.services.models().toggle(id)?))
}

/// PATCH /api/v1/models/{id}/enable
pub async fn enable_model_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Model>, ServerError> {
    Ok(Json(state.services.models().enable(id)?))
}

/// PATCH /api/v1/models/{id}/disable
pub async fn disable_model_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Model>, ServerError> {
    Ok(Json(state.services.models().disable(id)?))
}

/// DELETE /api/v1/models/{id}
pub async fn delete_model_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ServerError> {
    state.services.models().delete(id)?;
    Ok(Json(DeletedResponse::new("Model deleted successfully")))
}
