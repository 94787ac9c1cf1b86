//! Message service.
//!
//! Messages carry no owner of their own. Every access resolves the message's
//! chat and checks it belongs to the caller; a message in someone else's
//! chat is reported as not found.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use synergia_store::{
    Chat, Feedback, Message, MessageType, MessageUpdate, Model, Store, StoreError,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, Result};
use crate::services::chat::BulkResult;

/// Auto-generated chat titles keep at most this many characters of content.
pub const AUTO_TITLE_MAX_CHARS: usize = 50;

/// Input for adding a message to an existing chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub model_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    #[serde(default)]
    pub tokens: Option<i64>,
}

/// Input for starting a new chat with its first message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoChatMessage {
    pub model_id: Uuid,
    pub content: String,
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub tokens: Option<i64>,
    #[serde(default)]
    pub chat_title: Option<String>,
}

fn default_message_type() -> MessageType {
    MessageType::User
}

/// A message with its model embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub model: Model,
}

/// A message together with the chat it was created in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageWithChat {
    pub message: MessageView,
    pub chat_id: Uuid,
}

/// Domain service for messages.
#[derive(Clone)]
pub struct MessageService {
    store: Arc<Store>,
}

impl MessageService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    // ── Creation ────────────────────────────────────────────────────

    /// Add a message to one of the caller's chats.
    pub fn create(&self, user_id: &str, input: NewMessage) -> Result<MessageView> {
        validate_content(&input.content)?;
        validate_tokens(input.tokens)?;
        let model = self.usable_model(input.model_id)?;
        self.owned_chat(input.chat_id, user_id)?;

        let mut message = Message::new(input.chat_id, model.id, input.message_type, input.content);
        message.tokens = input.tokens;
        self.store.insert_message(&message)?;

        debug!(message_id = %message.id, chat_id = %message.chat_id, "Message created");
        Ok(MessageView { message, model })
    }

    /// Create a chat and its first message in one step.
    ///
    /// Without an explicit title the chat is named after the content,
    /// truncated to [`AUTO_TITLE_MAX_CHARS`] characters plus `...`.
    pub fn create_with_auto_chat(
        &self,
        user_id: &str,
        input: AutoChatMessage,
    ) -> Result<MessageWithChat> {
        validate_content(&input.content)?;
        validate_tokens(input.tokens)?;
        let model = self.usable_model(input.model_id)?;

        let title = match input.chat_title {
            Some(title) if !title.is_empty() => title,
            _ => auto_title(&input.content),
        };
        let chat = Chat::new(user_id).with_title(title);
        self.store.insert_chat(&chat)?;

        let mut message = Message::new(chat.id, model.id, input.message_type, input.content);
        message.tokens = input.tokens;
        self.store.insert_message(&message)?;

        info!(chat_id = %chat.id, message_id = %message.id, "Chat started with first message");
        Ok(MessageWithChat {
            message: MessageView { message, model },
            chat_id: chat.id,
        })
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn get(&self, id: Uuid, user_id: &str) -> Result<MessageView> {
        let message = self.owned_message(id, user_id, false)?;
        self.view(message)
    }

    pub fn exists(&self, id: Uuid, user_id: &str) -> Result<bool> {
        match self.owned_message(id, user_id, false) {
            Ok(_) => Ok(true),
            Err(DomainError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn list(
        &self,
        chat_id: Uuid,
        user_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<MessageView>> {
        self.owned_chat(chat_id, user_id)?;
        let messages = self.store.list_messages(chat_id, include_deleted)?;
        self.views(messages)
    }

    pub fn list_by_type(
        &self,
        chat_id: Uuid,
        user_id: &str,
        message_type: MessageType,
    ) -> Result<Vec<MessageView>> {
        self.owned_chat(chat_id, user_id)?;
        let messages = self.store.list_messages_by_type(chat_id, message_type)?;
        self.views(messages)
    }

    pub fn latest(&self, chat_id: Uuid, user_id: &str) -> Result<Option<MessageView>> {
        self.owned_chat(chat_id, user_id)?;
        self.store
            .latest_message(chat_id)?
            .map(|m| self.view(m))
            .transpose()
    }

    pub fn list_with_feedback(&self, chat_id: Uuid, user_id: &str) -> Result<Vec<MessageView>> {
        self.owned_chat(chat_id, user_id)?;
        let messages = self.store.list_messages_with_feedback(chat_id)?;
        self.views(messages)
    }

    pub fn count(&self, chat_id: Uuid, user_id: &str, include_deleted: bool) -> Result<usize> {
        self.owned_chat(chat_id, user_id)?;
        Ok(self.store.count_messages(chat_id, include_deleted)?)
    }

    // ── Updates ─────────────────────────────────────────────────────

    pub fn update(&self, id: Uuid, user_id: &str, update: MessageUpdate) -> Result<MessageView> {
        if let Some(content) = &update.content {
            validate_content(content)?;
        }
        validate_tokens(update.tokens)?;
        self.owned_message(id, user_id, false)?;

        let message = self
            .store
            .update_message(id, &update)
            .map_err(|e| map_missing(e, id))?;
        self.view(message)
    }

    pub fn update_content(&self, id: Uuid, user_id: &str, content: &str) -> Result<MessageView> {
        self.update(
            id,
            user_id,
            MessageUpdate {
                content: Some(content.to_string()),
                ..Default::default()
            },
        )
    }

    /// Rate a message. Only `positive` and `negative` are accepted.
    pub fn update_feedback(&self, id: Uuid, user_id: &str, feedback: &str) -> Result<MessageView> {
        let feedback: Feedback = feedback.parse().map_err(|_| {
            DomainError::Validation("Feedback must be either 'positive' or 'negative'".into())
        })?;
        self.owned_message(id, user_id, false)?;

        let message = self
            .store
            .set_message_feedback(id, feedback)
            .map_err(|e| map_missing(e, id))?;
        self.view(message)
    }

    // ── Deletion ────────────────────────────────────────────────────

    /// Soft delete.
    pub fn delete(&self, id: Uuid, user_id: &str) -> Result<()> {
        self.owned_message(id, user_id, false)?;
        if !self.store.soft_delete_message(id)? {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Remove a message for good, whether or not it was soft deleted.
    pub fn delete_permanently(&self, id: Uuid, user_id: &str) -> Result<()> {
        self.owned_message(id, user_id, true)?;
        if !self.store.hard_delete_message(id)? {
            return Err(not_found(id));
        }
        info!(message_id = %id, "Message permanently deleted");
        Ok(())
    }

    /// Soft delete every live message in a chat. Returns how many changed.
    pub fn delete_all_in_chat(&self, chat_id: Uuid, user_id: &str) -> Result<usize> {
        self.owned_chat(chat_id, user_id)?;
        Ok(self.store.soft_delete_chat_messages(chat_id)?)
    }

    pub fn bulk_delete(&self, ids: &[Uuid], user_id: &str) -> Result<BulkResult> {
        self.bulk(ids, |id| self.delete(id, user_id))
    }

    pub fn bulk_delete_permanently(&self, ids: &[Uuid], user_id: &str) -> Result<BulkResult> {
        self.bulk(ids, |id| self.delete_permanently(id, user_id))
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn bulk(&self, ids: &[Uuid], op: impl Fn(Uuid) -> Result<()>) -> Result<BulkResult> {
        let mut result = BulkResult::default();
        for id in ids {
            match op(*id) {
                Ok(()) => result.success_count += 1,
                Err(DomainError::NotFound(_)) => result.failed_count += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    fn usable_model(&self, model_id: Uuid) -> Result<Model> {
        let model = self.store.get_model(model_id)?.ok_or_else(|| {
            DomainError::Validation(format!("Model with ID '{}' does not exist", model_id))
        })?;
        if !model.is_enabled {
            return Err(DomainError::Validation(format!(
                "Model '{}' is currently disabled",
                model.name
            )));
        }
        Ok(model)
    }

    fn owned_chat(&self, chat_id: Uuid, user_id: &str) -> Result<Chat> {
        self.store.get_chat(chat_id, user_id)?.ok_or_else(|| {
            DomainError::NotFound(format!(
                "Chat with ID '{}' does not exist or you don't have access",
                chat_id
            ))
        })
    }

    fn owned_message(&self, id: Uuid, user_id: &str, include_deleted: bool) -> Result<Message> {
        let message = if include_deleted {
            self.store.get_message_any(id)?
        } else {
            self.store.get_message(id)?
        }
        .ok_or_else(|| not_found(id))?;

        match self.store.get_chat_any(message.chat_id)? {
            Some(chat) if chat.user_id == user_id => Ok(message),
            _ => Err(not_found(id)),
        }
    }

    fn model_of(&self, message: &Message) -> Result<Model> {
        self.store.get_model(message.model_id)?.ok_or_else(|| {
            DomainError::NotFound(format!("Model with ID '{}' not found", message.model_id))
        })
    }

    fn view(&self, message: Message) -> Result<MessageView> {
        let model = self.model_of(&message)?;
        Ok(MessageView { message, model })
    }

    fn views(&self, messages: Vec<Message>) -> Result<Vec<MessageView>> {
        let mut models: HashMap<Uuid, Model> = HashMap::new();
        let mut views = Vec::with_capacity(messages.len());

        for message in messages {
            let model = match models.get(&message.model_id) {
                Some(model) => model.clone(),
                None => {
                    let model = self.model_of(&message)?;
                    models.insert(model.id, model.clone());
                    model
                }
            };
            views.push(MessageView { message, model });
        }
        Ok(views)
    }
}

/// First [`AUTO_TITLE_MAX_CHARS`] characters of `content`, with `...`
/// appended when anything was cut.
fn auto_title(content: &str) -> String {
    if content.chars().count() > AUTO_TITLE_MAX_CHARS {
        let head: String = content.chars().take(AUTO_TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

fn not_found(id: Uuid) -> DomainError {
    DomainError::NotFound(format!("Message with ID '{}' not found", id))
}

fn map_missing(err: StoreError, id: Uuid) -> DomainError {
    match err {
        StoreError::NotFound(_) => not_found(id),
        other => other.into(),
    }
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(DomainError::Validation(
            "Message content must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_tokens(tokens: Option<i64>) -> Result<()> {
    if tokens.is_some_and(|t| t < 0) {
        return Err(DomainError::Validation(
            "tokens must not be negative".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        svc: MessageService,
        store: Arc<Store>,
        model: Model,
        chat: Chat,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let model = Model::new("gpt-4o", "openai", 5.0);
        store.insert_model(&model).unwrap();
        let chat = Chat::new("alice");
        store.insert_chat(&chat).unwrap();
        Fixture {
            svc: MessageService::new(store.clone()),
            store,
            model,
            chat,
        }
    }

    impl Fixture {
        fn new_message(&self, message_type: MessageType, content: &str) -> NewMessage {
            NewMessage {
                chat_id: self.chat.id,
                model_id: self.model.id,
                message_type,
                content: content.to_string(),
                tokens: None,
            }
        }

        fn post(&self, content: &str) -> MessageView {
            self.svc
                .create("alice", self.new_message(MessageType::User, content))
                .unwrap()
        }
    }

    #[test]
    fn test_create_embeds_model() {
        let f = fixture();
        let view = f.post("hello");

        assert_eq!(view.model, f.model);
        assert_eq!(view.message.chat_id, f.chat.id);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["type"], "user");
        assert_eq!(json["model"]["name"], "gpt-4o");
    }

    #[test]
    fn test_create_requires_enabled_model() {
        let f = fixture();
        f.store.set_model_enabled(f.model.id, false).unwrap();

        let err = f
            .svc
            .create("alice", f.new_message(MessageType::User, "hi"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("disabled")));

        let mut input = f.new_message(MessageType::User, "hi");
        input.model_id = Uuid::new_v4();
        assert!(matches!(
            f.svc.create("alice", input),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_create_requires_owned_chat() {
        let f = fixture();
        let err = f
            .svc
            .create("mallory", f.new_message(MessageType::User, "hi"))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_create_validates_input() {
        let f = fixture();
        assert!(matches!(
            f.svc.create("alice", f.new_message(MessageType::User, "   ")),
            Err(DomainError::Validation(_))
        ));

        let mut input = f.new_message(MessageType::User, "hi");
        input.tokens = Some(-1);
        assert!(matches!(
            f.svc.create("alice", input),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_auto_chat_title() {
        assert_eq!(auto_title("short"), "short");

        let exact = "x".repeat(50);
        assert_eq!(auto_title(&exact), exact);

        let long = "y".repeat(51);
        assert_eq!(auto_title(&long), format!("{}...", "y".repeat(50)));

        // Counts characters, not bytes.
        let accents = "é".repeat(60);
        assert_eq!(auto_title(&accents).chars().count(), 53);
    }

    #[test]
    fn test_create_with_auto_chat() {
        let f = fixture();
        let content = "Tell me everything about the history of the Roman Empire please";

        let created = f
            .svc
            .create_with_auto_chat(
                "bob",
                AutoChatMessage {
                    model_id: f.model.id,
                    content: content.to_string(),
                    message_type: MessageType::User,
                    tokens: Some(14),
                    chat_title: None,
                },
            )
            .unwrap();

        let chat = f.store.get_chat(created.chat_id, "bob").unwrap().unwrap();
        assert_eq!(chat.title, Some(auto_title(content)));
        assert!(chat.title.unwrap().ends_with("..."));
        assert_eq!(created.message.message.tokens, Some(14));
        assert_eq!(created.message.message.chat_id, created.chat_id);

        let titled = f
            .svc
            .create_with_auto_chat(
                "bob",
                AutoChatMessage {
                    model_id: f.model.id,
                    content: "hi".into(),
                    message_type: MessageType::User,
                    tokens: None,
                    chat_title: Some("Greeting".into()),
                },
            )
            .unwrap();
        let chat = f.store.get_chat(titled.chat_id, "bob").unwrap().unwrap();
        assert_eq!(chat.title.as_deref(), Some("Greeting"));
    }

    #[test]
    fn test_messages_authorized_through_chat() {
        let f = fixture();
        let view = f.post("secret");
        let id = view.message.id;

        assert!(f.svc.get(id, "alice").is_ok());
        assert!(matches!(f.svc.get(id, "mallory"), Err(DomainError::NotFound(_))));
        assert!(!f.svc.exists(id, "mallory").unwrap());
        assert!(matches!(
            f.svc.update_content(id, "mallory", "hacked"),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            f.svc.delete_permanently(id, "mallory"),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            f.svc.list(f.chat.id, "mallory", false),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_listing() {
        let f = fixture();
        f.svc
            .create("alice", f.new_message(MessageType::System, "rules"))
            .unwrap();
        f.post("question");
        let answer = f
            .svc
            .create("alice", f.new_message(MessageType::Ai, "answer"))
            .unwrap();

        assert_eq!(f.svc.list(f.chat.id, "alice", false).unwrap().len(), 3);
        assert_eq!(
            f.svc
                .list_by_type(f.chat.id, "alice", MessageType::Ai)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            f.svc.latest(f.chat.id, "alice").unwrap().unwrap().message.id,
            answer.message.id
        );
        assert_eq!(f.svc.count(f.chat.id, "alice", false).unwrap(), 3);
    }

    #[test]
    fn test_feedback() {
        let f = fixture();
        let id = f.post("hello").message.id;

        let rated = f.svc.update_feedback(id, "alice", "positive").unwrap();
        assert_eq!(rated.message.feedback, Some(Feedback::Positive));

        assert!(matches!(
            f.svc.update_feedback(id, "alice", "great"),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(f.svc.list_with_feedback(f.chat.id, "alice").unwrap().len(), 1);
    }

    #[test]
    fn test_soft_and_permanent_delete() {
        let f = fixture();
        let a = f.post("one").message.id;
        let b = f.post("two").message.id;

        f.svc.delete(a, "alice").unwrap();
        assert!(matches!(f.svc.delete(a, "alice"), Err(DomainError::NotFound(_))));
        assert_eq!(f.svc.count(f.chat.id, "alice", false).unwrap(), 1);
        assert_eq!(f.svc.count(f.chat.id, "alice", true).unwrap(), 2);

        // Soft-deleted messages can still be purged.
        f.svc.delete_permanently(a, "alice").unwrap();
        assert_eq!(f.svc.count(f.chat.id, "alice", true).unwrap(), 1);

        assert_eq!(f.svc.delete_all_in_chat(f.chat.id, "alice").unwrap(), 1);
        assert!(!f.svc.exists(b, "alice").unwrap());
    }

    #[test]
    fn test_bulk_delete() {
        let f = fixture();
        let a = f.post("one").message.id;
        let b = f.post("two").message.id;

        let result = f
            .svc
            .bulk_delete(&[a, b, Uuid::new_v4()], "alice")
            .unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_count, 1);

        let result = f
            .svc
            .bulk_delete_permanently(&[a, b], "mallory")
            .unwrap();
        assert_eq!(result.success_count, 0);
        assert_eq!(result.failed_count, 2);

        let result = f.svc.bulk_delete_permanently(&[a, b], "alice").unwrap();
        assert_eq!(result.success_count, 2);
    }
}
