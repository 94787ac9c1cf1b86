//! Domain services.
//!
//! Each service wraps the shared [`Store`] and is cheap to clone.

pub mod chat;
pub mod message;
pub mod model;

use std::sync::Arc;

use synergia_store::Store;
use tracing::info;

/// Domain services facade.
///
/// Main entry point for the transport layer.
#[derive(Clone)]
pub struct DomainServices {
    models: model::ModelService,
    chats: chat::ChatService,
    messages: message::MessageService,
}

impl DomainServices {
    /// Create all services over one store.
    pub fn new(store: Arc<Store>) -> Self {
        info!("Initializing domain services");

        Self {
            models: model::ModelService::new(store.clone()),
            chats: chat::ChatService::new(store.clone()),
            messages: message::MessageService::new(store),
        }
    }

    /// Get the model service.
    pub fn models(&self) -> &model::ModelService {
        &self.models
    }

    /// Get the chat service.
    pub fn chats(&self) -> &chat::ChatService {
        &self.chats
    }

    /// Get the message service.
    pub fn messages(&self) -> &message::MessageService {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chat::NewChat;
    use crate::services::model::NewModel;

    #[test]
    fn test_services_share_store() {
        let services = DomainServices::new(Arc::new(Store::open_in_memory().unwrap()));

        services
            .models()
            .create(NewModel::new("gpt-4o", "openai", 5.0))
            .unwrap();
        assert_eq!(services.models().count(false).unwrap(), 1);

        let chat = services.chats().create("u", NewChat::default()).unwrap();
        assert!(services.chats().exists(chat.id, "u").unwrap());
    }
}
