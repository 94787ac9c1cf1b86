//! Session authentication middleware.
//!
//! Every API request carries the identity provider's session id in the
//! `X-Session-Id` header. The middleware verifies it through the shared
//! [`SessionVerifier`](synergia_session::SessionVerifier) and injects an
//! [`AuthenticatedUser`] into request extensions.
//!
//! All verification failures produce the same 401 response; the kind of
//! failure only shows up in the `reason` field and in logs.

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use synergia_session::AuthError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Header carrying the session identifier.
pub const SESSION_HEADER: &str = "X-Session-Id";

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// The caller, as established by a verified session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub session_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rejection
// ─────────────────────────────────────────────────────────────────────────────

/// 401 response for a request whose session could not be trusted.
#[derive(Debug)]
pub struct AuthRejection(pub AuthError);

impl From<AuthError> for AuthRejection {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        let body = serde_json::json!({
            "error": "unauthorized",
            "code": status.as_u16(),
            "reason": self.0.to_string(),
        });

        let mut response = (status, Json(body)).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication middleware function.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthRejection> {
    // A header that is not valid ASCII can never name a real session.
    let session_id = match request.headers().get(SESSION_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AuthRejection(AuthError::InvalidCredential))?
                .to_string(),
        ),
        None => None,
    };

    let record = match state.verifier.verify(session_id.as_deref()).await {
        Ok(record) => record,
        Err(e) => {
            warn!(
                reason = e.reason(),
                error = %e,
                path = %request.uri().path(),
                "Session verification failed"
            );
            return Err(AuthRejection(e));
        }
    };

    debug!(user_id = %record.user_id, "Request authenticated");
    request.extensions_mut().insert(AuthenticatedUser {
        user_id: record.user_id,
        // Keyed the same way the cache is, so logout removes the right entry.
        session_id: session_id.unwrap_or(record.id),
    });

    Ok(next.run(request).await)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{Extension, Router, middleware, routing::get};
    use synergia_domain::{DomainServices, Store};
    use synergia_session::{
        CacheConfig, MockProvider, SessionCache, SessionRecord, SessionVerifier,
    };
    use tower::ServiceExt;

    use crate::config::ServerConfig;

    fn create_test_state(provider: Arc<MockProvider>) -> AppState {
        let verifier = SessionVerifier::new(SessionCache::new(CacheConfig::default()), provider);
        let services = DomainServices::new(Arc::new(Store::open_in_memory().unwrap()));
        AppState::new(ServerConfig::default(), verifier, services)
    }

    fn create_test_router(state: AppState) -> Router {
        Router::new()
            .route(
                "/protected",
                get(|Extension(user): Extension<AuthenticatedUser>| async move { user.user_id }),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn send(router: Router, session: Option<&str>) -> Response {
        let mut builder = Request::builder().uri("/protected");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        router.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_active_session_passes_user_through() {
        let provider = Arc::new(
            MockProvider::new().with_session(SessionRecord::new("sess_1", "user_1", "active")),
        );
        let router = create_test_router(create_test_state(provider));

        let response = send(router, Some("sess_1")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"user_1");
    }

    #[tokio::test]
    async fn test_missing_header_is_401_without_provider_call() {
        let provider = Arc::new(MockProvider::new());
        let router = create_test_router(create_test_state(provider.clone()));

        let response = send(router, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
        assert_eq!(provider.request_count(), 0);

        let json = json_body(response).await;
        assert_eq!(json["error"], "unauthorized");
        assert_eq!(json["code"], 401);
    }

    #[tokio::test]
    async fn test_non_ascii_header_is_401_without_provider_call() {
        let provider = Arc::new(MockProvider::new());
        let router = create_test_router(create_test_state(provider.clone()));

        let request = Request::builder()
            .uri("/protected")
            .header(SESSION_HEADER, HeaderValue::from_bytes(&[0xFF, b's', 0xFE]).unwrap())
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(provider.request_count(), 0);
        assert_eq!(json_body(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_every_failure_kind_is_401() {
        let provider = Arc::new(
            MockProvider::new()
                .with_session(SessionRecord::new("sess_revoked", "user_1", "revoked"))
                .with_failure("sess_broken", "connection reset"),
        );
        let state = create_test_state(provider);

        for session in ["sess_unknown", "sess_revoked", "sess_broken"] {
            let response = send(create_test_router(state.clone()), Some(session)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{session}");
            let json = json_body(response).await;
            assert_eq!(json["error"], "unauthorized");
            assert!(json["reason"].is_string());
        }
    }

    #[tokio::test]
    async fn test_inactive_reason_names_status() {
        let provider = Arc::new(
            MockProvider::new().with_session(SessionRecord::new("sess_x", "user_1", "expired")),
        );
        let router = create_test_router(create_test_state(provider));

        let json = json_body(send(router, Some("sess_x")).await).await;
        assert!(json["reason"].as_str().unwrap().contains("expired"));
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let provider = Arc::new(
            MockProvider::new().with_session(SessionRecord::new("sess_1", "user_1", "active")),
        );
        let state = create_test_state(provider.clone());

        for _ in 0..2 {
            let response = send(create_test_router(state.clone()), Some("sess_1")).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(provider.request_count(), 1);
    }
}
