//! Client identification for rate limiting.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::state::AppState;

/// Key used when no address information is available.
pub const ANONYMOUS: &str = "anonymous";

/// Rate-limit key for the calling client.
///
/// The socket peer address, or [`ANONYMOUS`] when there is none. With
/// `server.trust_proxy_headers` enabled, the first `X-Forwarded-For` hop and
/// then `X-Real-IP` take precedence; otherwise both headers are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<Arc<AppState>> for ClientKey {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self(resolve(
            &parts.headers,
            peer,
            state.trust_proxy_headers,
        )))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy
        && let Some(forwarded) = forwarded_client(headers)
    {
        return forwarded;
    }
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => ANONYMOUS.to_string(),
    }
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    if let Some(first) = header(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(first.to_string());
    }
    header(headers, "x-real-ip").map(str::to_string)
}
