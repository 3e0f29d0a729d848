//! # id8-cli
//!
//! The `id8` binary:
//! - `id8 serve` runs the HTTP API
//! - `id8 config …` inspects and edits the TOML configuration
//! - `id8 stack …` builds, exports and imports a personal stack

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config_handlers;
pub mod logging;
pub mod stack_handlers;

use id8_api::{AppState, Server};
use id8_core::Id8Config;

pub use cli::{Cli, Command, ConfigAction, StackAction};

/// Start the API server, applying command-line bind overrides.
pub async fn serve(
    mut config: Id8Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!(
        backend = %config.catalog.backend,
        auth = config.auth.enabled,
        "starting id8 API"
    );
    if config.auth.enabled && config.auth.admin_token.is_none() {
        tracing::warn!("auth.admin_token is not set; admin routes will answer 503");
    }
    if config.server.trust_proxy_headers {
        tracing::info!("rate limits keyed on X-Forwarded-For / X-Real-IP");
    }
    let state = AppState::from_config(&config).await?;
    let server = Server::new(state, &config.server.host, config.server.port)?;
    server.run().await?;
    Ok(())
}
