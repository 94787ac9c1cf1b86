//! Error types for session verification.

use std::time::Duration;

/// Why a session could not be trusted.
///
/// All variants are request-scoped. Callers map every variant to the same
/// unauthorized response; the distinction exists for logs and diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session identifier was supplied.
    #[error("X-Session-Id header missing")]
    MissingCredential,

    /// The identity provider does not know this session.
    #[error("Invalid session")]
    InvalidCredential,

    /// The session exists but is not active.
    #[error("Session is not active: {0}")]
    InactiveCredential(String),

    /// The identity provider could not be consulted.
    #[error("Authentication failed: {0}")]
    VerificationFailed(#[from] ProviderError),
}

impl AuthError {
    /// Short machine-readable reason, used in logs and response bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::InactiveCredential(_) => "inactive_credential",
            AuthError::VerificationFailed(_) => "verification_failed",
        }
    }
}

/// Failure talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected status code from the provider.
    #[error("identity provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be understood.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The provider did not answer in time.
    #[error("identity provider timed out after {0:?}")]
    Timeout(Duration),

    /// Any other provider-side failure.
    #[error("{0}")]
    Other(String),
}

/// Result type for session verification.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_diagnostics() {
        let inactive = AuthError::InactiveCredential("expired".to_string());
        assert_eq!(inactive.to_string(), "Session is not active: expired");

        let failed = AuthError::from(ProviderError::Other("Clerk API Error".to_string()));
        assert_eq!(failed.to_string(), "Authentication failed: Clerk API Error");
    }

    #[test]
    fn test_reasons() {
        assert_eq!(AuthError::MissingCredential.reason(), "missing_credential");
        assert_eq!(AuthError::InvalidCredential.reason(), "invalid_credential");
        assert_eq!(
            AuthError::InactiveCredential("revoked".into()).reason(),
            "inactive_credential"
        );
        assert_eq!(
            AuthError::VerificationFailed(ProviderError::Timeout(Duration::from_secs(1))).reason(),
            "verification_failed"
        );
    }
}
