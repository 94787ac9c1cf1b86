//! Message operations.
//!
//! Messages are not owner-scoped here; callers authorize through the chat.

use rusqlite::{Connection, params};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::types::{self, Feedback, Message, MessageType, MessageUpdate};

use super::{
    Store, format_timestamp, parse_timestamp, parse_uuid, query_count, query_list,
    query_optional,
};

const MESSAGE_COLUMNS: &str =
    "id, chat_id, model_id, type, content, tokens, feedback, is_deleted, created_at, updated_at";

impl Store {
    /// Insert a new message. The chat and model must exist.
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO messages (id, chat_id, model_id, type, content, tokens, feedback, is_deleted, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                message.id.to_string(),
                message.chat_id.to_string(),
                message.model_id.to_string(),
                message.message_type.as_str(),
                message.content,
                message.tokens,
                message.feedback.map(|f| f.as_str()),
                message.is_deleted,
                format_timestamp(&message.created_at),
                format_timestamp(&message.updated_at),
            ],
        )?;

        debug!("Inserted message {} into chat {}", message.id, message.chat_id);
        Ok(())
    }

    /// Get a live message by ID.
    pub fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
        Self::get_message_in(&self.conn(), id)
    }

    /// Get a message by ID, including soft-deleted ones.
    pub fn get_message_any(&self, id: Uuid) -> Result<Option<Message>> {
        query_optional(
            &self.conn(),
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
            params![id.to_string()],
            Self::row_to_message,
        )
    }

    /// List a chat's messages, oldest first.
    pub fn list_messages(&self, chat_id: Uuid, include_deleted: bool) -> Result<Vec<Message>> {
        let sql = if include_deleted {
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1 \
                 ORDER BY created_at ASC, rowid ASC"
            )
        } else {
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1 AND is_deleted = 0 \
                 ORDER BY created_at ASC, rowid ASC"
            )
        };
        query_list(
            &self.conn(),
            &sql,
            params![chat_id.to_string()],
            Self::row_to_message,
        )
    }

    /// List a chat's live messages of one type, oldest first.
    pub fn list_messages_by_type(
        &self,
        chat_id: Uuid,
        message_type: MessageType,
    ) -> Result<Vec<Message>> {
        query_list(
            &self.conn(),
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages \
                 WHERE chat_id = ?1 AND type = ?2 AND is_deleted = 0 \
                 ORDER BY created_at ASC, rowid ASC"
            ),
            params![chat_id.to_string(), message_type.as_str()],
            Self::row_to_message,
        )
    }

    /// The most recent live message in a chat.
    pub fn latest_message(&self, chat_id: Uuid) -> Result<Option<Message>> {
        query_optional(
            &self.conn(),
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1 AND is_deleted = 0 \
                 ORDER BY created_at DESC, rowid DESC LIMIT 1"
            ),
            params![chat_id.to_string()],
            Self::row_to_message,
        )
    }

    /// List a chat's live messages that carry feedback, oldest first.
    pub fn list_messages_with_feedback(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        query_list(
            &self.conn(),
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages \
                 WHERE chat_id = ?1 AND feedback IS NOT NULL AND is_deleted = 0 \
                 ORDER BY created_at ASC, rowid ASC"
            ),
            params![chat_id.to_string()],
            Self::row_to_message,
        )
    }

    /// Apply a partial update to a live message. Bumps `updated_at`.
    pub fn update_message(&self, id: Uuid, update: &MessageUpdate) -> Result<Message> {
        let conn = self.conn();

        let mut message = Self::get_message_in(&conn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("Message {}", id)))?;

        if let Some(content) = &update.content {
            message.content = content.clone();
        }
        if let Some(tokens) = update.tokens {
            message.tokens = Some(tokens);
        }
        if let Some(feedback) = update.feedback {
            message.feedback = Some(feedback);
        }
        message.updated_at = types::now();

        conn.execute(
            r#"
            UPDATE messages
            SET content = ?2, tokens = ?3, feedback = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                message.id.to_string(),
                message.content,
                message.tokens,
                message.feedback.map(|f| f.as_str()),
                format_timestamp(&message.updated_at),
            ],
        )?;

        Ok(message)
    }

    /// Set or replace the feedback on a live message.
    pub fn set_message_feedback(&self, id: Uuid, feedback: Feedback) -> Result<Message> {
        self.update_message(
            id,
            &MessageUpdate {
                feedback: Some(feedback),
                ..Default::default()
            },
        )
    }

    /// Mark a live message as deleted.
    pub fn soft_delete_message(&self, id: Uuid) -> Result<bool> {
        let rows_affected = self.conn().execute(
            "UPDATE messages SET is_deleted = 1, updated_at = ?2 WHERE id = ?1 AND is_deleted = 0",
            params![id.to_string(), format_timestamp(&types::now())],
        )?;
        Ok(rows_affected > 0)
    }

    /// Permanently remove a message, live or deleted.
    pub fn hard_delete_message(&self, id: Uuid) -> Result<bool> {
        let rows_affected = self
            .conn()
            .execute("DELETE FROM messages WHERE id = ?1", params![id.to_string()])?;
        Ok(rows_affected > 0)
    }

    /// Soft delete every live message in a chat. Returns how many changed.
    pub fn soft_delete_chat_messages(&self, chat_id: Uuid) -> Result<usize> {
        let count = self.conn().execute(
            "UPDATE messages SET is_deleted = 1, updated_at = ?2 \
             WHERE chat_id = ?1 AND is_deleted = 0",
            params![chat_id.to_string(), format_timestamp(&types::now())],
        )?;
        debug!("Soft deleted {} messages in chat {}", count, chat_id);
        Ok(count)
    }

    /// Count a chat's messages.
    pub fn count_messages(&self, chat_id: Uuid, include_deleted: bool) -> Result<usize> {
        let sql = if include_deleted {
            "SELECT COUNT(*) FROM messages WHERE chat_id = ?1"
        } else {
            "SELECT COUNT(*) FROM messages WHERE chat_id = ?1 AND is_deleted = 0"
        };
        query_count(&self.conn(), sql, params![chat_id.to_string()])
    }

    fn get_message_in(conn: &Connection, id: Uuid) -> Result<Option<Message>> {
        query_optional(
            conn,
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1 AND is_deleted = 0"),
            params![id.to_string()],
            Self::row_to_message,
        )
    }

    pub(crate) fn row_to_message(row: &rusqlite::Row) -> Result<Message> {
        let id: String = row.get(0)?;
        let chat_id: String = row.get(1)?;
        let model_id: String = row.get(2)?;
        let message_type: String = row.get(3)?;
        let feedback: Option<String> = row.get(6)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;

        Ok(Message {
            id: parse_uuid(&id)?,
            chat_id: parse_uuid(&chat_id)?,
            model_id: parse_uuid(&model_id)?,
            message_type: message_type.parse()?,
            content: row.get(4)?,
            tokens: row.get(5)?,
            feedback: feedback.as_deref().map(str::parse).transpose()?,
            is_deleted: row.get(7)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}
