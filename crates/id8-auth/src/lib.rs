//! Admin authentication for ID8 services.
//!
//! Provides:
//! - [`AuthenticatedAdmin`]: principal inserted into request extensions
//! - [`TokenValidator`]: async token validation, with [`AdminTokenValidator`]
//!   checking a static bearer token
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware parameterised over `TokenValidator`
//! - [`AuthConfig`]: configuration for the auth layer
//! - [`AuthError`]: auth-specific error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod admin;
mod error;
mod middleware;

pub use admin::{AdminTokenValidator, AuthenticatedAdmin, admin_from_parts};
pub use error::AuthError;
pub use middleware::{AuthLayer, AuthService};

use id8_core::config::AuthSettings;

/// Configuration for the auth middleware.
///
/// The default matches [`AuthSettings::default`]: enabled with no token, so
/// every request is refused until a token is set.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Whether authentication is enabled. When false, all requests pass through.
    pub enabled: bool,
    /// Token accepted from `Authorization: Bearer`.
    pub admin_token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::from(&AuthSettings::default())
    }
}

impl From<&AuthSettings> for AuthConfig {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            enabled: settings.enabled,
            admin_token: settings.admin_token.clone(),
        }
    }
}

/// Trait for validating tokens and extracting the admin identity.
///
/// The middleware calls `validate()` with the bearer token and inserts the
/// returned admin into request extensions on success.
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate a token and return the authenticated admin.
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<AuthenticatedAdmin, AuthError>> + Send + '_>,
    >;
}
