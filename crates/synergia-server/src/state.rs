//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use synergia_domain::DomainServices;
use synergia_session::SessionVerifier;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Session verification (provider + cache).
    pub verifier: SessionVerifier,

    /// Domain services over the shared store.
    pub services: DomainServices,

    started_at: Instant,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: ServerConfig, verifier: SessionVerifier, services: DomainServices) -> Self {
        Self {
            config: Arc::new(config),
            verifier,
            services,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Time since the state was built.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
