//! Admin principal and the static-token validator.

use std::future::Future;
use std::pin::Pin;

use crate::{AuthConfig, AuthError, TokenValidator};

/// An authenticated administrator.
///
/// Inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAdmin {
    /// Who was authenticated, for audit logs.
    pub subject: String,
}

impl AuthenticatedAdmin {
    /// Principal used when auth is disabled.
    pub fn local() -> Self {
        Self {
            subject: "local".to_string(),
        }
    }
}

/// Extract the `AuthenticatedAdmin` from HTTP request `Parts`, if present.
pub fn admin_from_parts(parts: &http::request::Parts) -> Option<&AuthenticatedAdmin> {
    parts.extensions.get::<AuthenticatedAdmin>()
}

/// Validates bearer tokens against the configured admin token.
#[derive(Debug, Clone, Default)]
pub struct AdminTokenValidator;

impl TokenValidator for AdminTokenValidator {
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedAdmin, AuthError>> + Send + '_>> {
        let result = match config.admin_token.as_deref() {
            None | Some("") => Err(AuthError::NotConfigured),
            Some(expected) if constant_time_eq(expected.as_bytes(), token.as_bytes()) => {
                Ok(AuthenticatedAdmin {
                    subject: "admin-token".to_string(),
                })
            }
            Some(_) => Err(AuthError::InvalidToken),
        };
        Box::pin(async move { result })
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
