//! Cache-fronted session verification.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::SessionCache;
use crate::error::{AuthError, ProviderError, Result};
use crate::provider::{IdentityProvider, SessionRecord};

/// Verifies session identifiers, consulting the identity provider only on a
/// cache miss.
///
/// Only active sessions are cached. Failures are returned to the caller and
/// never retried here.
///
/// Concurrent misses on the same id each call the provider; there is no
/// in-flight coalescing. A verification that is in flight while the same
/// session is invalidated may still insert its result afterwards, so the
/// session stays trusted until its TTL runs out or it is invalidated again.
#[derive(Clone)]
pub struct SessionVerifier {
    cache: SessionCache<SessionRecord>,
    provider: Arc<dyn IdentityProvider>,
    timeout: Option<Duration>,
}

impl SessionVerifier {
    /// Create a verifier with no timeout of its own.
    pub fn new(cache: SessionCache<SessionRecord>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            cache,
            provider,
            timeout: None,
        }
    }

    /// Bound each provider call. An elapsed timeout is a verification failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The underlying cache.
    pub fn cache(&self) -> &SessionCache<SessionRecord> {
        &self.cache
    }

    /// Resolve a session identifier into a trusted record.
    pub async fn verify(&self, session_id: Option<&str>) -> Result<SessionRecord> {
        let session_id = match session_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(AuthError::MissingCredential),
        };

        if let Some(record) = self.cache.lookup(session_id).await {
            return Ok(record);
        }

        debug!(session_id = %session_id, "Session cache miss, asking identity provider");

        let record = self
            .fetch(session_id)
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        if !record.is_active() {
            return Err(AuthError::InactiveCredential(record.status));
        }

        self.cache.insert(session_id, record.clone()).await;
        Ok(record)
    }

    /// Drop a session from the cache so the next verification re-contacts
    /// the provider.
    pub async fn invalidate(&self, session_id: &str) -> bool {
        self.cache.invalidate(session_id).await
    }

    async fn fetch(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let call = self.provider.get_session(session_id);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ProviderError::Timeout(limit))?,
            None => call.await,
        };
        Ok(result?)
    }
}
