//! Stored entity types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Current time at the precision the store persists (microseconds), so a
/// value handed back to the caller equals the one read back later.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ─────────────────────────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────────────────────────

/// An AI model messages can be attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    /// Unique across all models.
    pub name: String,
    pub provider: String,
    pub price_per_million_tokens: f64,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Create a new, enabled model.
    pub fn new(name: impl Into<String>, provider: impl Into<String>, price: f64) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            provider: provider.into(),
            price_per_million_tokens: price,
            is_enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set whether the model starts enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }
}

/// Partial update for a model. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUpdate {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub price_per_million_tokens: Option<f64>,
    pub is_enabled: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Create a new, untitled chat for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: None,
            summary: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Partial update for a chat. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Ai,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Ai => "ai",
            MessageType::System => "system",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageType::User),
            "ai" => Ok(MessageType::Ai),
            "system" => Ok(MessageType::System),
            other => Err(StoreError::InvalidData(format!(
                "unknown message type '{other}', expected user, ai or system"
            ))),
        }
    }
}

/// User rating of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Positive => "positive",
            Feedback::Negative => "negative",
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feedback {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Feedback::Positive),
            "negative" => Ok(Feedback::Negative),
            other => Err(StoreError::InvalidData(format!(
                "unknown feedback '{other}', expected positive or negative"
            ))),
        }
    }
}

/// One message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub model_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub tokens: Option<i64>,
    pub feedback: Option<Feedback>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message.
    pub fn new(
        chat_id: Uuid,
        model_id: Uuid,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            chat_id,
            model_id,
            message_type,
            content: content.into(),
            tokens: None,
            feedback: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the token count.
    pub fn with_tokens(mut self, tokens: i64) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

/// Partial update for a message. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdate {
    pub content: Option<String>,
    pub tokens: Option<i64>,
    pub feedback: Option<Feedback>,
}
