//! Chat endpoints. Every chat is scoped to the authenticated user.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use synergia_domain::{BulkResult, Chat, ChatUpdate, NewChat};

use super::{BulkRequest, DeletedResponse, ExistsResponse, IncludeDeletedQuery};
use crate::auth::AuthenticatedUser;
use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub summary: String,
}

/// Chat totals for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCountResponse {
    pub total: usize,
    pub active: usize,
    pub deleted: usize,
}

/// POST /api/v1/chats
pub async fn create_chat_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(input): Json<NewChat>,
) -> Result<(StatusCode, Json<Chat>), ServerError> {
    let chat = state.services.chats().create(&user.user_id, input)?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// GET /api/v1/chats
pub async fn list_chats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<IncludeDeletedQuery>,
) -> Result<Json<Vec<Chat>>, ServerError> {
    let chats = state
        .services
        .chats()
        .list(&user.user_id, query.include_deleted)?;
    Ok(Json(chats))
}

/// GET /api/v1/chats/active
pub async fn list_active_chats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Chat>>, ServerError> {
    Ok(Json(state.services.chats().list_active(&user.user_id)?))
}

/// GET /api/v1/chats/deleted
pub async fn list_deleted_chats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Chat>>, ServerError> {
    Ok(Json(state.services.chats().list_deleted(&user.user_id)?))
}

/// GET /api/v1/chats/count
pub async fn count_chats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ChatCountResponse>, ServerError> {
    let chats = state.services.chats();
    let total = chats.count(&user.user_id, true)?;
    let active = chats.count_active(&user.user_id)?;

    Ok(Json(ChatCountResponse {
        total,
        active,
        deleted: total - active,
    }))
}

/// GET /api/v1/chats/{id}
pub async fn get_chat_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Chat>, ServerError> {
    Ok(Json(state.services.chats().get(id, &user.user_id)?))
}

/// PUT /api/v1/chats/{id}
pub async fn update_chat_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(update): Json<ChatUpdate>,
) -> Result<Json<Chat>, ServerError> {
    Ok(Json(state.services.chats().update(id, &user.user_id, update)?))
}

/// PATCH /api/v1/chats/{id}/title
pub async fn update_chat_title_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<TitleRequest>,
) -> Result<Json<Chat>, ServerError> {
    let chat = state
        .services
        .chats()
        .update_title(id, &user.user_id, &req.title)?;
    Ok(Json(chat))
}

/// PATCH /api/v1/chats/{id}/summary
pub async fn update_chat_summary_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<Chat>, ServerError> {
    let chat = state
        .services
        .chats()
        .update_summary(id, &user.user_id, &req.summary)?;
    Ok(Json(chat))
}

/// DELETE /api/v1/chats/{id}
pub async fn delete_chat_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ServerError> {
    state.services.chats().delete(id, &user.user_id)?;
    info!(chat_id = %id, user_id = %user.user_id, "Soft deleted chat");
    Ok(Json(DeletedResponse::new("Chat deleted successfully")))
}

/// DELETE /api/v1/chats/{id}/permanent
pub async fn delete_chat_permanently_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ServerError> {
    state.services.chats().delete_permanently(id, &user.user_id)?;
    Ok(Json(DeletedResponse::new("Chat permanently deleted")))
}

/// POST /api/v1/chats/{id}/restore
pub async fn restore_chat_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Chat>, ServerError> {
    Ok(Json(state.services.chats().restore(id, &user.user_id)?))
}

/// GET /api/v1/chats/{id}/exists
pub async fn chat_exists_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExistsResponse>, ServerError> {
    let exists = state.services.chats().exists(id, &user.user_id)?;
    Ok(Json(ExistsResponse { exists }))
}

/// POST /api/v1/chats/bulk/delete
pub async fn bulk_delete_chats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkResult>, ServerError> {
    let result = state.services.chats().bulk_delete(&req.ids, &user.user_id)?;
    info!(
        user_id = %user.user_id,
        success = result.success_count,
        failed = result.failed_count,
        "Bulk deleted chats"
    );
    Ok(Json(result))
}

/// POST /api/v1/chats/bulk/restore
pub async fn bulk_restore_chats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkResult>, ServerError> {
    Ok(Json(
        state.services.chats().bulk_restore(&req.ids, &user.user_id)?,
    ))
}

/// POST /api/v1/chats/bulk/delete/permanent
pub async fn bulk_delete_chats_permanently_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkResult>, ServerError> {
    Ok(Json(
        state
            .services
            .chats()
            .bulk_delete_permanently(&req.ids, &user.user_id)?,
    ))
}
