//! Session verification cache for Synergia.
//!
//! Every authenticated request carries a session identifier issued by an
//! external identity provider (Clerk). Verifying it remotely on each request
//! is expensive, so this crate provides:
//! - A bounded cache that evicts in insertion order (FIFO, never reordered by reads)
//! - A fixed TTL per entry with lazy expiry on lookup and an optional sweep task
//! - An [`IdentityProvider`] seam and a reqwest-backed [`ClerkProvider`]
//! - [`SessionVerifier`], which fronts the provider with the cache
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use synergia_session::{CacheConfig, ClerkConfig, ClerkProvider, SessionCache, SessionVerifier};
//!
//! let config = CacheConfig::default()
//!     .with_max_size(1000)
//!     .with_ttl(Duration::from_secs(300));
//!
//! let provider = ClerkProvider::new(ClerkConfig::new("sk_test_..."))?;
//! let verifier = SessionVerifier::new(SessionCache::new(config), Arc::new(provider));
//!
//! let record = verifier.verify(Some("sess_123")).await?;
//! ```

mod cache;
mod clerk;
mod config;
mod error;
mod provider;
mod verifier;

pub use cache::{CacheEntry, CacheStats, SessionCache};
pub use clerk::{ClerkConfig, ClerkProvider, DEFAULT_CLERK_API_URL};
pub use config::{CacheConfig, DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_SIZE, DEFAULT_TTL};
pub use error::{AuthError, ProviderError, Result};
pub use provider::{ACTIVE_STATUS, IdentityProvider, MockProvider, SessionRecord};
pub use verifier::SessionVerifier;
