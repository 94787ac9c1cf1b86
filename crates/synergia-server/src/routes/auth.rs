//! Session endpoints.

use axum::{Extension, extract::State, http::StatusCode};
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::state::AppState;

/// POST /api/v1/auth/logout
///
/// Drops the caller's session from the verification cache. The identity
/// provider remains the authority on whether the session is still valid.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> StatusCode {
    let removed = state.verifier.invalidate(&user.session_id).await;
    info!(user_id = %user.user_id, removed, "Session cache entry invalidated");
    StatusCode::NO_CONTENT
}
