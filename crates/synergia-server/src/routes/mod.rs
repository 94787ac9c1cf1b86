//! API routes.

pub mod auth;
pub mod chats;
pub mod health;
pub mod messages;
pub mod models;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use health::health_routes;

// ─────────────────────────────────────────────────────────────────────────────
// Shared request/response bodies
// ─────────────────────────────────────────────────────────────────────────────

/// `{ "count": n }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// `{ "exists": bool }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Confirmation for delete operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub message: String,
}

impl DeletedResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of the bulk endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRequest {
    #[serde(alias = "chat_ids", alias = "message_ids")]
    pub ids: Vec<Uuid>,
}

/// `?include_deleted=`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct IncludeDeletedQuery {
    #[serde(default)]
    pub include_deleted: bool,
}
