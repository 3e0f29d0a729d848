//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

/// Build the full router with shared layers applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::tracking::router())
        .merge(routes::catalog::router())
        .merge(routes::admin::router(state.auth.clone()))
        .merge(routes::health::router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            state.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ID8 API server.
pub struct Server {
    state: Arc<AppState>,
    addr: SocketAddr,
}

impl Server {
    /// Create a server that will bind `host:port`.
    pub fn new(state: AppState, host: &str, port: u16) -> id8_core::Result<Self> {
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| id8_core::Error::config(format!("invalid bind address {host}:{port}: {e}")))?;
        Ok(Self {
            state: Arc::new(state),
            addr,
        })
    }

    /// Address the server binds.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Router for this server's state.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "id8-api listening");
        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        tracing::info!("id8-api stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use id8_catalog::MemoryCatalog;
    use id8_core::Id8Config;

    #[test]
    fn test_server_new_parses_address() {
        let state = AppState::new(Arc::new(MemoryCatalog::new()), &Id8Config::default());
        let server = Server::new(state, "127.0.0.1", 8080).unwrap();
        assert_eq!(server.addr().port(), 8080);
    }

    #[test]
    fn test_server_new_rejects_bad_host() {
        let state = AppState::new(Arc::new(MemoryCatalog::new()), &Id8Config::default());
        assert!(Server::new(state, "not a host", 80).is_err());
    }
}
