//! HTTP API server for Synergia.
//!
//! This crate is the transport layer over the domain services: a REST API
//! under `/api/v1` where every route except the health check is guarded by
//! session verification.
//!
//! # Features
//!
//! - Model catalogue, chat and message endpoints
//! - `X-Session-Id` authentication backed by a verification cache
//! - CORS for the web client
//! - Request logging
//!
//! # Example
//!
//! ```ignore
//! use synergia_server::{AppState, Server, ServerConfig};
//!
//! let state = AppState::new(ServerConfig::default(), verifier, services);
//! Server::from_state(state).run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{AuthRejection, AuthenticatedUser, SESSION_HEADER, auth_middleware};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use middleware::request_logging_middleware;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The Synergia HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .nest(
                "/api/v1",
                routes::health_routes().merge(self.api_routes()),
            )
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// API routes (v1).
    ///
    /// All API routes require authentication via the auth middleware.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, patch, post};
        use routes::{auth, chats, messages, models};

        Router::new()
            // Models
            .route(
                "/models",
                post(models::create_model_handler).get(models::list_models_handler),
            )
            .route("/models/enabled", get(models::list_enabled_models_handler))
            .route("/models/providers", get(models::list_providers_handler))
            .route(
                "/models/provider/{provider}",
                get(models::list_models_by_provider_handler),
            )
            .route("/models/count", get(models::count_models_handler))
            .route("/models/name/{name}", get(models::get_model_by_name_handler))
            .route(
                "/models/{id}",
                get(models::get_model_handler)
                    .put(models::update_model_handler)
                    .delete(models::delete_model_handler),
            )
            .route("/models/{id}/toggle", patch(models::toggle_model_handler))
            .route("/models/{id}/enable", patch(models::enable_model_handler))
            .route("/models/{id}/disable", patch(models::disable_model_handler))
            // Chats
            .route(
                "/chats",
                post(chats::create_chat_handler).get(chats::list_chats_handler),
            )
            .route("/chats/active", get(chats::list_active_chats_handler))
            .route("/chats/deleted", get(chats::list_deleted_chats_handler))
            .route("/chats/count", get(chats::count_chats_handler))
            .route("/chats/bulk/delete", post(chats::bulk_delete_chats_handler))
            .route("/chats/bulk/restore", post(chats::bulk_restore_chats_handler))
            .route(
                "/chats/bulk/delete/permanent",
                post(chats::bulk_delete_chats_permanently_handler),
            )
            .route(
                "/chats/{id}",
                get(chats::get_chat_handler)
                    .put(chats::update_chat_handler)
                    .delete(chats::delete_chat_handler),
            )
            .route("/chats/{id}/title", patch(chats::update_chat_title_handler))
            .route(
                "/chats/{id}/summary",
                patch(chats::update_chat_summary_handler),
            )
            .route(
                "/chats/{id}/permanent",
                axum::routing::delete(chats::delete_chat_permanently_handler),
            )
            .route("/chats/{id}/restore", post(chats::restore_chat_handler))
            .route("/chats/{id}/exists", get(chats::chat_exists_handler))
            // Messages
            .route("/messages", post(messages::create_message_handler))
            .route(
                "/messages/with-chat",
                post(messages::create_message_with_chat_handler),
            )
            .route(
                "/messages/bulk/delete",
                post(messages::bulk_delete_messages_handler),
            )
            .route(
                "/messages/bulk/delete/permanent",
                post(messages::bulk_delete_messages_permanently_handler),
            )
            .route(
                "/messages/chat/{chat_id}",
                get(messages::list_chat_messages_handler),
            )
            .route(
                "/messages/chat/{chat_id}/type/{message_type}",
                get(messages::list_messages_by_type_handler),
            )
            .route(
                "/messages/chat/{chat_id}/active",
                get(messages::list_active_messages_handler),
            )
            .route(
                "/messages/chat/{chat_id}/user",
                get(messages::list_user_messages_handler),
            )
            .route(
                "/messages/chat/{chat_id}/ai",
                get(messages::list_ai_messages_handler),
            )
            .route(
                "/messages/chat/{chat_id}/latest",
                get(messages::latest_message_handler),
            )
            .route(
                "/messages/chat/{chat_id}/count",
                get(messages::count_chat_messages_handler),
            )
            .route(
                "/messages/chat/{chat_id}/feedback",
                get(messages::list_feedback_messages_handler),
            )
            .route(
                "/messages/chat/{chat_id}/all",
                axum::routing::delete(messages::delete_chat_messages_handler),
            )
            .route(
                "/messages/{id}",
                get(messages::get_message_handler)
                    .put(messages::update_message_handler)
                    .delete(messages::delete_message_handler),
            )
            .route(
                "/messages/{id}/content",
                patch(messages::update_message_content_handler),
            )
            .route(
                "/messages/{id}/feedback",
                patch(messages::update_message_feedback_handler),
            )
            .route(
                "/messages/{id}/permanent",
                axum::routing::delete(messages::delete_message_permanently_handler),
            )
            .route("/messages/{id}/exists", get(messages::message_exists_handler))
            // Auth
            .route("/auth/logout", post(auth::logout_handler))
            // Auth middleware for all API routes
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                auth_middleware,
            ))
    }

    /// CORS layer for the configured origins, if any.
    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins: Vec<HeaderValue> = self
            .state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            return None;
        }

        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        self.run_until(addr, std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        info!("Starting server on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
