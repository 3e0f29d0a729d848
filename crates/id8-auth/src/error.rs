//! Auth-specific error types.

/// Errors that can occur during admin authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing authentication token")]
    MissingToken,

    /// The bearer token did not match.
    #[error("invalid admin token")]
    InvalidToken,

    /// Auth is enabled but no admin token is configured.
    #[error("admin authentication is enabled but no admin token is configured")]
    NotConfigured,
}

impl AuthError {
    /// Whether this error should result in a 401 (vs. a 503).
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::MissingToken | AuthError::InvalidToken)
    }
}
