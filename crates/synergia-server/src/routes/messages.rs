//! Message endpoints.
//!
//! Access to a message is granted through the chat that owns it.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use synergia_domain::{
    AutoChatMessage, BulkResult, MessageType, MessageUpdate, MessageView, MessageWithChat,
    NewMessage,
};

use super::{BulkRequest, CountResponse, DeletedResponse, ExistsResponse, IncludeDeletedQuery};
use crate::auth::AuthenticatedUser;
use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedCountResponse {
    pub deleted_count: usize,
}

/// POST /api/v1/messages
pub async fn create_message_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(input): Json<NewMessage>,
) -> Result<(StatusCode, Json<MessageView>), ServerError> {
    let message = state.services.messages().create(&user.user_id, input)?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/v1/messages/with-chat
pub async fn create_message_with_chat_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(input): Json<AutoChatMessage>,
) -> Result<(StatusCode, Json<MessageWithChat>), ServerError> {
    let created = state
        .services
        .messages()
        .create_with_auto_chat(&user.user_id, input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/messages/chat/{chat_id}
pub async fn list_chat_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<IncludeDeletedQuery>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    let messages = state
        .services
        .messages()
        .list(chat_id, &user.user_id, query.include_deleted)?;
    Ok(Json(messages))
}

/// GET /api/v1/messages/chat/{chat_id}/type/{message_type}
pub async fn list_messages_by_type_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((chat_id, message_type)): Path<(Uuid, String)>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    let message_type: MessageType = message_type.parse().map_err(|_| {
        ServerError::BadRequest(format!(
            "Invalid message type '{}': expected user, ai or system",
            message_type
        ))
    })?;

    let messages = state
        .services
        .messages()
        .list_by_type(chat_id, &user.user_id, message_type)?;
    Ok(Json(messages))
}

/// GET /api/v1/messages/chat/{chat_id}/active
pub async fn list_active_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    Ok(Json(
        state.services.messages().list(chat_id, &user.user_id, false)?,
    ))
}

/// GET /api/v1/messages/chat/{chat_id}/user
pub async fn list_user_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    Ok(Json(state.services.messages().list_by_type(
        chat_id,
        &user.user_id,
        MessageType::User,
    )?))
}

/// GET /api/v1/messages/chat/{chat_id}/ai
pub async fn list_ai_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    Ok(Json(state.services.messages().list_by_type(
        chat_id,
        &user.user_id,
        MessageType::Ai,
    )?))
}

/// GET /api/v1/messages/chat/{chat_id}/latest
pub async fn latest_message_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<MessageView>, ServerError> {
    state
        .services
        .messages()
        .latest(chat_id, &user.user_id)?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("No messages in chat {}", chat_id)))
}

/// GET /api/v1/messages/chat/{chat_id}/count
pub async fn count_chat_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<IncludeDeletedQuery>,
) -> Result<Json<CountResponse>, ServerError> {
    let count = state
        .services
        .messages()
        .count(chat_id, &user.user_id, query.include_deleted)?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/v1/messages/chat/{chat_id}/feedback
pub async fn list_feedback_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    let messages = state
        .services
        .messages()
        .list_with_feedback(chat_id, &user.user_id)?;
    Ok(Json(messages))
}

/// DELETE /api/v1/messages/chat/{chat_id}/all
pub async fn delete_chat_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<DeletedCountResponse>, ServerError> {
    let deleted_count = state
        .services
        .messages()
        .delete_all_in_chat(chat_id, &user.user_id)?;
    Ok(Json(DeletedCountResponse { deleted_count }))
}

/// GET /api/v1/messages/{id}
pub async fn get_message_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageView>, ServerError> {
    Ok(Json(state.services.messages().get(id, &user.user_id)?))
}

/// GET /api/v1/messages/{id}/exists
pub async fn message_exists_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExistsResponse>, ServerError> {
    let exists = state.services.messages().exists(id, &user.user_id)?;
    Ok(Json(ExistsResponse { exists }))
}

/// PUT /api/v1/messages/{id}
pub async fn update_message_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(update): Json<MessageUpdate>,
) -> Result<Json<MessageView>, ServerError> {
    Ok(Json(
        state.services.messages().update(id, &user.user_id, update)?,
    ))
}

/// PATCH /api/v1/messages/{id}/content
pub async fn update_message_content_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<ContentRequest>,
) -> Result<Json<MessageView>, ServerError> {
    let message = state
        .services
        .messages()
        .update_content(id, &user.user_id, &req.content)?;
    Ok(Json(message))
}

/// PATCH /api/v1/messages/{id}/feedback
pub async fn update_message_feedback_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<MessageView>, ServerError> {
    let message = state
        .services
        .messages()
        .update_feedback(id, &user.user_id, &req.feedback)?;
    Ok(Json(message))
}

/// DELETE /api/v1/messages/{id}
pub async fn delete_message_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ServerError> {
    state.services.messages().delete(id, &user.user_id)?;
    Ok(Json(DeletedResponse::new("Message deleted successfully")))
}

/// DELETE /api/v1/messages/{id}/permanent
pub async fn delete_message_permanently_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ServerError> {
    state
        .services
        .messages()
        .delete_permanently(id, &user.user_id)?;
    Ok(Json(DeletedResponse::new("Message permanently deleted")))
}

/// POST /api/v1/messages/bulk/delete
pub async fn bulk_delete_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkResult>, ServerError> {
    Ok(Json(
        state
            .services
            .messages()
            .bulk_delete(&req.ids, &user.user_id)?,
    ))
}

/// POST /api/v1/messages/bulk/delete/permanent
pub async fn bulk_delete_messages_permanently_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkResult>, ServerError> {
    Ok(Json(
        state
            .services
            .messages()
            .bulk_delete_permanently(&req.ids, &user.user_id)?,
    ))
}
