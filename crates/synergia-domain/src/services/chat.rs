//! Chat service.
//!
//! Every operation takes the caller's `user_id`; chats owned by someone else
//! behave exactly like chats that do not exist.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use synergia_store::{Chat, ChatUpdate, Store};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, Result};

/// Title given to chats created without one by [`ChatService::get_or_create`].
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Input for creating a chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChat {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl NewChat {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            summary: None,
        }
    }
}

/// Outcome of a bulk operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub success_count: usize,
    pub failed_count: usize,
}

impl BulkResult {
    fn record(&mut self, ok: bool) {
        if ok {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
    }
}

/// Domain service for chats.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<Store>,
}

impl ChatService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn create(&self, user_id: &str, input: NewChat) -> Result<Chat> {
        let mut chat = Chat::new(user_id);
        chat.title = input.title;
        chat.summary = input.summary;
        self.store.insert_chat(&chat)?;

        info!(chat_id = %chat.id, user_id = %user_id, "Chat created");
        Ok(chat)
    }

    /// Fetch `chat_id` if given, otherwise create a new chat.
    ///
    /// A new chat is titled `title`, or [`DEFAULT_CHAT_TITLE`] when none is
    /// supplied.
    pub fn get_or_create(
        &self,
        user_id: &str,
        chat_id: Option<Uuid>,
        title: Option<&str>,
    ) -> Result<Chat> {
        match chat_id {
            Some(id) => self.get(id, user_id),
            None => self.create(
                user_id,
                NewChat::titled(title.unwrap_or(DEFAULT_CHAT_TITLE)),
            ),
        }
    }

    pub fn get(&self, id: Uuid, user_id: &str) -> Result<Chat> {
        self.store
            .get_chat(id, user_id)?
            .ok_or_else(|| not_found(id))
    }

    pub fn exists(&self, id: Uuid, user_id: &str) -> Result<bool> {
        Ok(self.store.get_chat(id, user_id)?.is_some())
    }

    pub fn list(&self, user_id: &str, include_deleted: bool) -> Result<Vec<Chat>> {
        Ok(self.store.list_chats(user_id, include_deleted)?)
    }

    pub fn list_active(&self, user_id: &str) -> Result<Vec<Chat>> {
        self.list(user_id, false)
    }

    pub fn list_deleted(&self, user_id: &str) -> Result<Vec<Chat>> {
        Ok(self.store.list_deleted_chats(user_id)?)
    }

    pub fn update(&self, id: Uuid, user_id: &str, update: ChatUpdate) -> Result<Chat> {
        self.store
            .update_chat(id, user_id, &update)
            .map_err(|e| map_missing(e, id))
    }

    pub fn update_title(&self, id: Uuid, user_id: &str, title: &str) -> Result<Chat> {
        self.update(
            id,
            user_id,
            ChatUpdate {
                title: Some(title.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn update_summary(&self, id: Uuid, user_id: &str, summary: &str) -> Result<Chat> {
        self.update(
            id,
            user_id,
            ChatUpdate {
                summary: Some(summary.to_string()),
                ..Default::default()
            },
        )
    }

    /// Soft delete.
    pub fn delete(&self, id: Uuid, user_id: &str) -> Result<()> {
        if !self.store.soft_delete_chat(id, user_id)? {
            return Err(not_found(id));
        }
        debug!(chat_id = %id, "Chat soft deleted");
        Ok(())
    }

    /// Restore a soft-deleted chat.
    pub fn restore(&self, id: Uuid, user_id: &str) -> Result<Chat> {
        self.store.restore_chat(id, user_id).map_err(|e| match e {
            synergia_store::StoreError::NotFound(_) => DomainError::NotFound(format!(
                "Deleted chat with ID '{}' not found",
                id
            )),
            other => other.into(),
        })
    }

    /// Remove a chat and its messages for good.
    pub fn delete_permanently(&self, id: Uuid, user_id: &str) -> Result<()> {
        if !self.store.hard_delete_chat(id, user_id)? {
            return Err(not_found(id));
        }
        info!(chat_id = %id, "Chat permanently deleted");
        Ok(())
    }

    pub fn count(&self, user_id: &str, include_deleted: bool) -> Result<usize> {
        Ok(self.store.count_chats(user_id, include_deleted)?)
    }

    pub fn count_active(&self, user_id: &str) -> Result<usize> {
        self.count(user_id, false)
    }

    pub fn count_deleted(&self, user_id: &str) -> Result<usize> {
        Ok(self.count(user_id, true)? - self.count(user_id, false)?)
    }

    pub fn bulk_delete(&self, ids: &[Uuid], user_id: &str) -> Result<BulkResult> {
        let mut result = BulkResult::default();
        for id in ids {
            result.record(self.store.soft_delete_chat(*id, user_id)?);
        }
        Ok(result)
    }

    pub fn bulk_restore(&self, ids: &[Uuid], user_id: &str) -> Result<BulkResult> {
        let mut result = BulkResult::default();
        for id in ids {
            match self.store.restore_chat(*id, user_id) {
                Ok(_) => result.record(true),
                Err(synergia_store::StoreError::NotFound(_)) => result.record(false),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(result)
    }

    pub fn bulk_delete_permanently(&self, ids: &[Uuid], user_id: &str) -> Result<BulkResult> {
        let mut result = BulkResult::default();
        for id in ids {
            result.record(self.store.hard_delete_chat(*id, user_id)?);
        }
        Ok(result)
    }
}

fn not_found(id: Uuid) -> DomainError {
    DomainError::NotFound(format!("Chat with ID '{}' not found", id))
}

fn map_missing(err: synergia_store::StoreError, id: Uuid) -> DomainError {
    match err {
        synergia_store::StoreError::NotFound(_) => not_found(id),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ChatService {
        ChatService::new(Arc::new(Store::open_in_memory().unwrap()))
    }

    #[test]
    fn test_create_and_get() {
        let svc = service();
        let chat = svc.create("u", NewChat::titled("Plans")).unwrap();

        let fetched = svc.get(chat.id, "u").unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Plans"));
        assert!(matches!(svc.get(chat.id, "other"), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_get_or_create() {
        let svc = service();

        let created = svc.get_or_create("u", None, None).unwrap();
        assert_eq!(created.title.as_deref(), Some(DEFAULT_CHAT_TITLE));

        let titled = svc.get_or_create("u", None, Some("Trip")).unwrap();
        assert_eq!(titled.title.as_deref(), Some("Trip"));

        let existing = svc.get_or_create("u", Some(created.id), Some("ignored")).unwrap();
        assert_eq!(existing.id, created.id);
        assert_eq!(existing.title.as_deref(), Some(DEFAULT_CHAT_TITLE));

        assert!(matches!(
            svc.get_or_create("intruder", Some(created.id), None),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_title_and_summary() {
        let svc = service();
        let chat = svc.create("u", NewChat::default()).unwrap();

        svc.update_title(chat.id, "u", "Renamed").unwrap();
        let chat = svc.update_summary(chat.id, "u", "About things").unwrap();
        assert_eq!(chat.title.as_deref(), Some("Renamed"));
        assert_eq!(chat.summary.as_deref(), Some("About things"));

        assert!(matches!(
            svc.update_title(chat.id, "other", "x"),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_restore_counts() {
        let svc = service();
        let a = svc.create("u", NewChat::default()).unwrap();
        svc.create("u", NewChat::default()).unwrap();

        svc.delete(a.id, "u").unwrap();
        assert!(matches!(svc.delete(a.id, "u"), Err(DomainError::NotFound(_))));
        assert!(!svc.exists(a.id, "u").unwrap());

        assert_eq!(svc.count("u", true).unwrap(), 2);
        assert_eq!(svc.count_active("u").unwrap(), 1);
        assert_eq!(svc.count_deleted("u").unwrap(), 1);
        assert_eq!(svc.list_deleted("u").unwrap()[0].id, a.id);

        svc.restore(a.id, "u").unwrap();
        assert!(matches!(svc.restore(a.id, "u"), Err(DomainError::NotFound(_))));
        assert_eq!(svc.list_active("u").unwrap().len(), 2);
    }

    #[test]
    fn test_permanent_delete() {
        let svc = service();
        let chat = svc.create("u", NewChat::default()).unwrap();

        assert!(matches!(
            svc.delete_permanently(chat.id, "other"),
            Err(DomainError::NotFound(_))
        ));
        svc.delete_permanently(chat.id, "u").unwrap();
        assert_eq!(svc.count("u", true).unwrap(), 0);
    }

    #[test]
    fn test_bulk_operations() {
        let svc = service();
        let a = svc.create("u", NewChat::default()).unwrap();
        let b = svc.create("u", NewChat::default()).unwrap();
        let theirs = svc.create("other", NewChat::default()).unwrap();
        let ids = [a.id, b.id, theirs.id, Uuid::new_v4()];

        let deleted = svc.bulk_delete(&ids, "u").unwrap();
        assert_eq!(
            deleted,
            BulkResult {
                success_count: 2,
                failed_count: 2
            }
        );

        let restored = svc.bulk_restore(&[a.id, a.id], "u").unwrap();
        assert_eq!(restored.success_count, 1);
        assert_eq!(restored.failed_count, 1);

        let purged = svc.bulk_delete_permanently(&ids, "u").unwrap();
        assert_eq!(purged.success_count, 2);
        assert_eq!(purged.failed_count, 2);
        assert!(svc.exists(theirs.id, "other").unwrap());
    }
}
