//! Domain services for Synergia.
//!
//! This crate sits between the HTTP layer and the store. It owns the rules
//! the store does not enforce:
//!
//! - **Models**: unique names, enable/disable, no deletion while referenced
//! - **Chats**: everything scoped to the calling user, soft delete and restore
//! - **Messages**: authorized through the owning chat, enabled models only
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use synergia_domain::{DomainServices, NewChat};
//! use synergia_store::Store;
//!
//! let services = DomainServices::new(Arc::new(Store::open_in_memory()?));
//! let chat = services.chats().create("user_123", NewChat::default())?;
//! ```

mod error;
pub mod services;

pub use error::{DomainError, Result};
pub use services::DomainServices;
pub use services::chat::{BulkResult, ChatService, DEFAULT_CHAT_TITLE, NewChat};
pub use services::message::{
    AUTO_TITLE_MAX_CHARS, AutoChatMessage, MessageService, MessageView, MessageWithChat,
    NewMessage,
};
pub use services::model::{ModelService, NewModel};

// Re-export store types used in service signatures
pub use synergia_store::{
    Chat, ChatUpdate, Feedback, Message, MessageType, MessageUpdate, Model, ModelUpdate, Store,
};
