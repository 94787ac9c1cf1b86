//! User-scoped chat operations.

use rusqlite::{Connection, params};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::types::{self, Chat, ChatUpdate};

use super::{
    Store, format_timestamp, parse_timestamp, parse_uuid, query_count, query_list,
    query_optional,
};

const CHAT_COLUMNS: &str = "id, user_id, title, summary, is_deleted, created_at, updated_at";

impl Store {
    /// Insert a new chat.
    pub fn insert_chat(&self, chat: &Chat) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO chats (id, user_id, title, summary, is_deleted, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                chat.id.to_string(),
                chat.user_id,
                chat.title,
                chat.summary,
                chat.is_deleted,
                format_timestamp(&chat.created_at),
                format_timestamp(&chat.updated_at),
            ],
        )?;

        debug!("Inserted chat {} for user {}", chat.id, chat.user_id);
        Ok(())
    }

    /// Get a live chat owned by `user_id`.
    pub fn get_chat(&self, id: Uuid, user_id: &str) -> Result<Option<Chat>> {
        Self::get_owned_chat_in(&self.conn(), id, user_id, Some(false))
    }

    /// Get a chat regardless of owner or deletion state.
    pub fn get_chat_any(&self, id: Uuid) -> Result<Option<Chat>> {
        query_optional(
            &self.conn(),
            &format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1"),
            params![id.to_string()],
            Self::row_to_chat,
        )
    }

    /// List a user's chats, most recently updated first.
    pub fn list_chats(&self, user_id: &str, include_deleted: bool) -> Result<Vec<Chat>> {
        let sql = if include_deleted {
            format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = ?1 \
                 ORDER BY updated_at DESC, rowid DESC"
            )
        } else {
            format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = ?1 AND is_deleted = 0 \
                 ORDER BY updated_at DESC, rowid DESC"
            )
        };
        query_list(&self.conn(), &sql, params![user_id], Self::row_to_chat)
    }

    /// List a user's soft-deleted chats, most recently updated first.
    pub fn list_deleted_chats(&self, user_id: &str) -> Result<Vec<Chat>> {
        query_list(
            &self.conn(),
            &format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = ?1 AND is_deleted = 1 \
                 ORDER BY updated_at DESC, rowid DESC"
            ),
            params![user_id],
            Self::row_to_chat,
        )
    }

    /// Apply a partial update to a live chat. Bumps `updated_at`.
    pub fn update_chat(&self, id: Uuid, user_id: &str, update: &ChatUpdate) -> Result<Chat> {
        let conn = self.conn();

        let mut chat = Self::get_owned_chat_in(&conn, id, user_id, Some(false))?
            .ok_or_else(|| StoreError::NotFound(format!("Chat {}", id)))?;

        if let Some(title) = &update.title {
            chat.title = Some(title.clone());
        }
        if let Some(summary) = &update.summary {
            chat.summary = Some(summary.clone());
        }
        chat.updated_at = types::now();

        conn.execute(
            "UPDATE chats SET title = ?2, summary = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                chat.id.to_string(),
                chat.title,
                chat.summary,
                format_timestamp(&chat.updated_at),
            ],
        )?;

        Ok(chat)
    }

    /// Mark a live chat as deleted. Returns `false` if there was none.
    pub fn soft_delete_chat(&self, id: Uuid, user_id: &str) -> Result<bool> {
        let rows_affected = self.conn().execute(
            "UPDATE chats SET is_deleted = 1, updated_at = ?3 \
             WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0",
            params![id.to_string(), user_id, format_timestamp(&types::now())],
        )?;
        Ok(rows_affected > 0)
    }

    /// Bring back a soft-deleted chat.
    pub fn restore_chat(&self, id: Uuid, user_id: &str) -> Result<Chat> {
        let conn = self.conn();

        let mut chat = Self::get_owned_chat_in(&conn, id, user_id, Some(true))?
            .ok_or_else(|| StoreError::NotFound(format!("Deleted chat {}", id)))?;
        chat.is_deleted = false;
        chat.updated_at = types::now();

        conn.execute(
            "UPDATE chats SET is_deleted = 0, updated_at = ?2 WHERE id = ?1",
            params![chat.id.to_string(), format_timestamp(&chat.updated_at)],
        )?;

        Ok(chat)
    }

    /// Permanently remove a chat, live or deleted, with all its messages.
    pub fn hard_delete_chat(&self, id: Uuid, user_id: &str) -> Result<bool> {
        let rows_affected = self.conn().execute(
            "DELETE FROM chats WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if rows_affected > 0 {
            debug!("Permanently deleted chat {}", id);
        }
        Ok(rows_affected > 0)
    }

    /// Count a user's chats.
    pub fn count_chats(&self, user_id: &str, include_deleted: bool) -> Result<usize> {
        let sql = if include_deleted {
            "SELECT COUNT(*) FROM chats WHERE user_id = ?1"
        } else {
            "SELECT COUNT(*) FROM chats WHERE user_id = ?1 AND is_deleted = 0"
        };
        query_count(&self.conn(), sql, params![user_id])
    }

    /// `deleted`: `Some(flag)` to require a deletion state, `None` for either.
    fn get_owned_chat_in(
        conn: &Connection,
        id: Uuid,
        user_id: &str,
        deleted: Option<bool>,
    ) -> Result<Option<Chat>> {
        let chat = query_optional(
            conn,
            &format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1 AND user_id = ?2"),
            params![id.to_string(), user_id],
            Self::row_to_chat,
        )?;
        Ok(chat.filter(|c| deleted.is_none_or(|d| c.is_deleted == d)))
    }

    pub(crate) fn row_to_chat(row: &rusqlite::Row) -> Result<Chat> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        Ok(Chat {
            id: parse_uuid(&id)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            summary: row.get(3)?,
            is_deleted: row.get(4)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, MessageType, Model};

    fn create_test_store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_chat_crud() {
        let store = create_test_store();
        let chat = Chat::new("user_1").with_title("Hello");
        store.insert_chat(&chat).unwrap();

        let fetched = store.get_chat(chat.id, "user_1").unwrap().unwrap();
        assert_eq!(fetched, chat);
        assert_eq!(fetched.title.as_deref(), Some("Hello"));
        assert!(fetched.summary.is_none());

        let updated = store
            .update_chat(
                chat.id,
                "user_1",
                &ChatUpdate {
                    summary: Some("Greetings".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title.as_deref(), Some("Hello"));
        assert_eq!(updated.summary.as_deref(), Some("Greetings"));
        assert!(updated.updated_at >= chat.updated_at);
        assert_eq!(store.get_chat(chat.id, "user_1").unwrap().unwrap(), updated);
    }

    #[test]
    fn test_chats_are_owner_scoped() {
        let store = create_test_store();
        let chat = Chat::new("alice");
        store.insert_chat(&chat).unwrap();

        assert!(store.get_chat(chat.id, "bob").unwrap().is_none());
        assert!(!store.soft_delete_chat(chat.id, "bob").unwrap());
        assert!(!store.hard_delete_chat(chat.id, "bob").unwrap());
        assert!(store.update_chat(chat.id, "bob", &ChatUpdate::default()).is_err());
        assert!(store.list_chats("bob", true).unwrap().is_empty());

        assert_eq!(store.get_chat_any(chat.id).unwrap().unwrap().user_id, "alice");
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let store = create_test_store();
        let chat = Chat::new("u");
        store.insert_chat(&chat).unwrap();

        // Restoring a live chat is not allowed.
        assert!(matches!(
            store.restore_chat(chat.id, "u"),
            Err(StoreError::NotFound(_))
        ));

        assert!(store.soft_delete_chat(chat.id, "u").unwrap());
        assert!(!store.soft_delete_chat(chat.id, "u").unwrap());
        assert!(store.get_chat(chat.id, "u").unwrap().is_none());
        assert_eq!(store.list_deleted_chats("u").unwrap().len(), 1);
        assert_eq!(store.count_chats("u", false).unwrap(), 0);
        assert_eq!(store.count_chats("u", true).unwrap(), 1);

        let restored = store.restore_chat(chat.id, "u").unwrap();
        assert!(!restored.is_deleted);
        assert!(store.get_chat(chat.id, "u").unwrap().is_some());
    }

    #[test]
    fn test_list_orders_by_recent_update() {
        let store = create_test_store();
        let first = Chat::new("u").with_title("first");
        let second = Chat::new("u").with_title("second");
        store.insert_chat(&first).unwrap();
        store.insert_chat(&second).unwrap();

        // Touching the first chat moves it to the front.
        store
            .update_chat(
                first.id,
                "u",
                &ChatUpdate {
                    title: Some("first again".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let titles: Vec<_> = store
            .list_chats("u", false)
            .unwrap()
            .into_iter()
            .filter_map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["first again", "second"]);
    }

    #[test]
    fn test_hard_delete_cascades_messages() {
        let store = create_test_store();
        let model = Model::new("m", "p", 1.0);
        store.insert_model(&model).unwrap();
        let chat = Chat::new("u");
        store.insert_chat(&chat).unwrap();
        let message = Message::new(chat.id, model.id, MessageType::User, "hi");
        store.insert_message(&message).unwrap();

        // Deleted chats can still be purged.
        store.soft_delete_chat(chat.id, "u").unwrap();
        assert!(store.hard_delete_chat(chat.id, "u").unwrap());

        assert!(store.get_chat_any(chat.id).unwrap().is_none());
        assert_eq!(store.count_messages(chat.id, true).unwrap(), 0);
    }
}
