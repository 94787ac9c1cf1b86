//! Identity provider seam.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Status string of a session that may be trusted.
pub const ACTIVE_STATUS: &str = "active";

/// A session as reported by the identity provider.
///
/// Unknown fields in the provider response are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_at: Option<i64>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
}

impl SessionRecord {
    /// Create a record with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            status: status.into(),
            client_id: None,
            last_active_at: None,
            expire_at: None,
        }
    }

    /// Whether the provider considers this session usable.
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// Source of truth for session validity.
///
/// `Ok(None)` means the provider does not know the session. Every other
/// failure to obtain an answer is a [`ProviderError`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, ProviderError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Provider
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum MockOutcome {
    Record(SessionRecord),
    Failure(String),
}

/// An in-memory provider for testing.
///
/// Sessions not registered with the mock are reported as unknown. Every
/// lookup is logged so tests can assert on how often the provider was hit.
#[derive(Debug, Default)]
pub struct MockProvider {
    sessions: Mutex<HashMap<String, MockOutcome>>,
    request_log: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create an empty mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session record, keyed by its id.
    pub fn with_session(self, record: SessionRecord) -> Self {
        self.set_session(record);
        self
    }

    /// Make lookups of `session_id` fail with a provider error.
    pub fn with_failure(self, session_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.into(), MockOutcome::Failure(message.into()));
        self
    }

    /// Delay every lookup by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Register or replace a session record.
    pub fn set_session(&self, record: SessionRecord) {
        self.sessions
            .lock()
            .unwrap()
            .insert(record.id.clone(), MockOutcome::Record(record));
    }

    /// Forget a session so later lookups report it as unknown.
    pub fn remove_session(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
    }

    /// Session ids looked up so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.request_log.lock().unwrap().clone()
    }

    /// Get the number of lookups made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, ProviderError> {
        self.request_log.lock().unwrap().push(session_id.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.sessions.lock().unwrap().get(session_id).cloned();
        match outcome {
            Some(MockOutcome::Record(record)) => Ok(Some(record)),
            Some(MockOutcome::Failure(message)) => Err(ProviderError::Other(message)),
            None => Ok(None),
        }
    }
}
