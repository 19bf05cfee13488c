use crate::core::error::AppError;
use crate::features::auth::SessionValidator;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Basic auth gate for the Swagger UI
pub async fn basic_auth_middleware(
    State(valid_credentials): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .is_some_and(|creds| creds == *valid_credentials);

    if authorized {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
        Body::from("Unauthorized"),
    )
        .into_response()
}

/// Shared state for the session middleware
#[derive(Clone)]
pub struct SessionState {
    pub validator: Arc<SessionValidator>,
    pub cookie_name: Arc<str>,
}

/// Pull the session token from `Authorization: Bearer` or the session cookie.
fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Some(bearer.trim());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(req.headers(), &state.cookie_name)
        .ok_or_else(|| AppError::Unauthorized("User not authenticated.".to_string()))?;

    let user = state.validator.validate_token(token)?;
    tracing::debug!(user_id = %user.user_id, "Session resolved");

    // Insert authenticated user into request extensions
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::{AuthenticatedUser, SessionClaims};
    use axum::{middleware::from_fn_with_state, routing::get, Router};
    use axum_test::TestServer;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use std::time::Duration;

    const SECRET: &str = "middleware-test-secret";

    fn session_server() -> TestServer {
        async fn whoami(user: AuthenticatedUser) -> String {
            user.user_id
        }

        let state = SessionState {
            validator: Arc::new(SessionValidator::new(SECRET, Duration::from_secs(0))),
            cookie_name: Arc::from("session"),
        };
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(state, session_middleware));
        TestServer::new(app).unwrap()
    }

    fn token(sub: &str) -> String {
        let claims = SessionClaims {
            sub: sub.to_string(),
            name: None,
            exp: (chrono::Utc::now().timestamp() + 600) as u64,
            iat: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=xyz"));

        assert_eq!(session_token(&headers, "session"), Some("abc"));
    }

    #[test]
    fn test_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=xyz; lang=en"),
        );

        assert_eq!(session_token(&headers, "session"), Some("xyz"));
        assert_eq!(session_token(&headers, "other"), None);
    }

    #[test]
    fn test_empty_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));

        assert_eq!(session_token(&headers, "session"), None);
    }

    #[tokio::test]
    async fn test_session_from_cookie_or_bearer() {
        let server = session_server();

        let response = server
            .get("/whoami")
            .add_header("cookie", format!("session={}", token("42")))
            .await;
        response.assert_status_ok();
        response.assert_text("42");

        let response = server
            .get("/whoami")
            .add_header("authorization", format!("Bearer {}", token("43")))
            .await;
        response.assert_text("43");
    }

    #[tokio::test]
    async fn test_missing_or_bad_session_is_unauthorized() {
        let server = session_server();

        let response = server.get("/whoami").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User not authenticated.");

        server
            .get("/whoami")
            .add_header("authorization", "Bearer not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
