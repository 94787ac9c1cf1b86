//! Clerk backend for [`IdentityProvider`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{IdentityProvider, SessionRecord};

/// Default Clerk backend API base URL.
pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";

/// Default timeout for Clerk requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Clerk session lookup.
#[derive(Clone)]
pub struct ClerkConfig {
    /// Backend secret key, sent as a bearer token.
    pub secret_key: String,

    /// Base URL for the API.
    pub api_url: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for ClerkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClerkConfig {
    /// Create a new config with the given secret key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_url: DEFAULT_CLERK_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set a custom API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// Looks sessions up through Clerk's backend API.
pub struct ClerkProvider {
    client: Client,
    config: ClerkConfig,
}

impl ClerkProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: ClerkConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the provider configuration.
    pub fn config(&self) -> &ClerkConfig {
        &self.config
    }

    fn session_url(&self, session_id: &str) -> String {
        format!(
            "{}/sessions/{}",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(session_id)
        )
    }
}

#[async_trait]
impl IdentityProvider for ClerkProvider {
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, ProviderError> {
        let response = self
            .client
            .get(self.session_url(session_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.secret_key))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!(session_id = %session_id, status = status.as_u16(), "Clerk session lookup");

        match status {
            StatusCode::OK => {
                let body = response.text().await?;
                let record = serde_json::from_str(&body)
                    .map_err(|e| ProviderError::Malformed(e.to_string()))?;
                Ok(Some(record))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ProviderError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
