//! SQLite storage for Synergia.
//!
//! Holds the three persistent entities of the chat API:
//! - [`Model`]: an AI model users can attribute messages to
//! - [`Chat`]: a conversation owned by a single user
//! - [`Message`]: one turn in a chat, soft-deletable
//!
//! Chats and messages are soft-deleted by default; hard deletes are explicit.
//! Ownership is enforced at this layer for chats (every chat query is scoped
//! by `user_id`) and by the domain layer for messages.
//!
//! # Example
//!
//! ```rust,ignore
//! use synergia_store::{Chat, Model, Store};
//!
//! let store = Store::open("synergia.db")?;
//! let model = Model::new("gpt-4o", "openai", 5.0);
//! store.insert_model(&model)?;
//!
//! let chat = Chat::new("user_123").with_title("Hello");
//! store.insert_chat(&chat)?;
//! ```

mod error;
mod store;
mod types;

pub use error::{Result, StoreError};
pub use store::Store;
pub use types::{
    Chat, ChatUpdate, Feedback, Message, MessageType, MessageUpdate, Model, ModelUpdate,
};
