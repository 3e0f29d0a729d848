//! Tower authentication middleware for admin routes.
//!
//! `AuthLayer` and `AuthService` wrap any inner service with bearer-token
//! validation. Generic over `TokenValidator`.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, AuthError, AuthenticatedAdmin, TokenValidator};

/// Tower `Layer` that wraps services with token authentication.
#[derive(Clone)]
pub struct AuthLayer<V: TokenValidator> {
    validator: Arc<V>,
    config: AuthConfig,
}

impl<V: TokenValidator> AuthLayer<V> {
    /// Create a new auth layer with the given validator and config.
    pub fn new(validator: Arc<V>, config: AuthConfig) -> Self {
        Self { validator, config }
    }
}

impl<V: TokenValidator, S> Layer<S> for AuthLayer<V> {
    type Service = AuthService<V, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that validates tokens before forwarding requests.
///
/// On success, inserts `AuthenticatedAdmin` into request extensions.
#[derive(Clone)]
pub struct AuthService<V: TokenValidator, S> {
    inner: S,
    validator: Arc<V>,
    config: AuthConfig,
}

impl<V, S> Service<Request<Body>> for AuthService<V, S>
where
    V: TokenValidator,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let validator = self.validator.clone();
        let config = self.config.clone();

        Box::pin(async move {
            // Local development: admin routes are open
            if !config.enabled {
                req.extensions_mut().insert(AuthenticatedAdmin::local());
                let resp = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                return Ok(resp.into_response());
            }

            let token = match extract_bearer_token(&req) {
                Some(t) => t.to_string(),
                None => return Ok(error_response(&AuthError::MissingToken)),
            };

            match validator.validate(&token, &config).await {
                Ok(admin) => {
                    log::debug!("Admin request authenticated as '{}'", admin.subject);
                    req.extensions_mut().insert(admin);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Err(auth_err) => {
                    log::warn!("Admin authentication failed: {auth_err}");
                    Ok(error_response(&auth_err))
                }
            }
        })
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 401 with `WWW-Authenticate` for client errors, 503 otherwise.
fn error_response(err: &AuthError) -> axum::response::Response {
    let body = serde_json::json!({ "error": err.to_string() });
    let status = if err.is_client_error() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut response = (status, axum::Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            http::header::WWW_AUTHENTICATE,
            http::HeaderValue::from_static(r#"Bearer realm="id8-admin""#),
        );
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::AdminTokenValidator;
    use std::sync::Mutex;
    use tower::ServiceExt;

    fn config_enabled() -> AuthConfig {
        AuthConfig {
            enabled: true,
            admin_token: Some("valid-token".to_string()),
        }
    }

    /// Mock inner service that captures the AuthenticatedAdmin.
    #[derive(Clone)]
    struct MockService {
        captured: Arc<Mutex<Option<AuthenticatedAdmin>>>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                captured: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl Service<Request<Body>> for MockService {
        type Response = axum::response::Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let captured = self.captured.clone();
            Box::pin(async move {
                let admin = req.extensions().get::<AuthenticatedAdmin>().cloned();
                *captured.lock().unwrap() = admin;
                Ok((StatusCode::OK, "ok").into_response())
            })
        }
    }

    fn layer(config: AuthConfig) -> AuthLayer<AdminTokenValidator> {
        AuthLayer::new(Arc::new(AdminTokenValidator), config)
    }

    #[test]
    fn test_extract_bearer_token() {
        let req = Request::builder()
            .header("Authorization", "Bearer my-token-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&req), Some("my-token-123"));

        let basic = Request::builder()
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&basic), None);

        let blank = Request::builder()
            .header("Authorization", "Bearer   ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&blank), None);
    }

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&AuthError::MissingToken);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(http::header::WWW_AUTHENTICATE));

        let resp = error_response(&AuthError::NotConfigured);
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_default_config_fails_closed() {
        let service = layer(AuthConfig::default()).layer(MockService::new());
        let req = Request::builder()
            .header("Authorization", "Bearer anything")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_disabled_passes_through_as_local_admin() {
        let mock = MockService::new();
        let captured = mock.captured.clone();
        let config = AuthConfig {
            enabled: false,
            admin_token: None,
        };
        let service = layer(config).layer(mock);

        let req = Request::builder().body(Body::empty()).unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            captured.lock().unwrap().as_ref().unwrap(),
            &AuthenticatedAdmin::local()
        );
    }

    #[tokio::test]
    async fn test_missing_token_returns_401() {
        let service = layer(config_enabled()).layer(MockService::new());
        let req = Request::builder().body(Body::empty()).unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_returns_401() {
        let service = layer(config_enabled()).layer(MockService::new());
        let req = Request::builder()
            .header("Authorization", "Bearer bad-token")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_passes_and_injects_admin() {
        let mock = MockService::new();
        let captured = mock.captured.clone();
        let service = layer(config_enabled()).layer(mock);

        let req = Request::builder()
            .header("Authorization", "Bearer valid-token")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let admin = captured.lock().unwrap();
        let admin = admin.as_ref().expect("AuthenticatedAdmin should be present");
        assert_eq!(admin.subject, "admin-token");
    }

    #[tokio::test]
    async fn test_enabled_without_token_returns_503() {
        let config = AuthConfig {
            enabled: true,
            admin_token: None,
        };
        let service = layer(config).layer(MockService::new());
        let req = Request::builder()
            .header("Authorization", "Bearer whatever")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
