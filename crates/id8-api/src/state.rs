//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use id8_auth::AuthConfig;
use id8_catalog::{CatalogBackend, create_catalog_backend};
use id8_core::Id8Config;
use id8_ratelimit::{RateLimitConfig, RateLimiter};

/// State handed to every handler as `State<Arc<AppState>>`.
pub struct AppState {
    /// Catalog source.
    pub catalog: Arc<dyn CatalogBackend>,
    /// Limiter for `POST /api/track/view`.
    pub view_limiter: RateLimiter,
    /// Limiter for `POST /api/track/install`.
    pub install_limiter: RateLimiter,
    /// Admin route auth.
    pub auth: AuthConfig,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Whether forwarding headers identify the client.
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Assemble state around an existing catalog backend.
    pub fn new(catalog: Arc<dyn CatalogBackend>, config: &Id8Config) -> Self {
        let limits = RateLimitConfig::from(&config.rate_limit);
        Self {
            catalog,
            view_limiter: RateLimiter::new("track-view", limits.clone()),
            install_limiter: RateLimiter::new("track-install", limits),
            auth: AuthConfig::from(&config.auth),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs.max(1)),
            trust_proxy_headers: config.server.trust_proxy_headers,
        }
    }

    /// Build state from configuration, creating the catalog backend.
    pub async fn from_config(config: &Id8Config) -> id8_core::Result<Self> {
        let catalog = create_catalog_backend(&config.catalog).await?;
        tracing::info!(backend = catalog.name(), "catalog backend ready");
        Ok(Self::new(catalog, config))
    }

    /// Replace both tracking limiters' settings.
    pub fn with_rate_limit(mut self, limits: RateLimitConfig) -> Self {
        self.view_limiter = RateLimiter::new("track-view", limits.clone());
        self.install_limiter = RateLimiter::new("track-install", limits);
        self
    }
}
