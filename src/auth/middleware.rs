//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::auth::{jwt::JwtHandler, models::IdentityClaims};
use crate::middleware::chain::{BoxHandler, Handler, Middleware};
use crate::response::{ApiError, ErrorCode, Locale};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Validates `Authorization: Bearer <jwt>` and stores the claims in the
/// request extensions for [`CurrentUser`]. Requests without a valid token are
/// answered with 401 and never reach the inner handler.
#[derive(Clone)]
pub struct Authenticate {
    jwt: Arc<JwtHandler>,
}

impl Authenticate {
    pub fn new(jwt: Arc<JwtHandler>) -> Self {
        Self { jwt }
    }
}

impl Middleware for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(AuthenticateHandler {
            jwt: self.jwt.clone(),
            next,
        })
    }
}

struct AuthenticateHandler {
    jwt: Arc<JwtHandler>,
    next: BoxHandler,
}

#[async_trait]
impl Handler for AuthenticateHandler {
    async fn call(&self, mut req: Request) -> Response {
        let outcome = match bearer_token(req.headers()) {
            Some(token) => self.jwt.validate(token, Utc::now()).map_err(|e| e.to_string()),
            None => Err("missing bearer token".to_string()),
        };

        match outcome {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                self.next.call(req).await
            }
            Err(reason) => {
                // The reason is for operators only; clients get one answer
                debug!(path = %req.uri().path(), reason = %reason, "Rejected request");
                ApiError::new(ErrorCode::Unauthenticated, Locale::from_uri(req.uri()))
                    .into_response()
            }
        }
    }
}

/// Token from an `Authorization: Bearer ...` header, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Extractor for the authenticated identity (use after [`Authenticate`])
pub struct CurrentUser(pub IdentityClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                ApiError::new(ErrorCode::Unauthenticated, Locale::from_uri(&parts.uri))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{SigningSecret, TokenConfig};
    use crate::auth::models::{User, UserRole};
    use crate::middleware::chain::endpoint;
    use axum::{body::Body, http::StatusCode, http::HeaderValue};
    use std::time::Duration;
    use uuid::Uuid;

    fn jwt(secret: &str) -> Arc<JwtHandler> {
        let secret = SigningSecret::new(secret).unwrap();
        Arc::new(JwtHandler::new(
            TokenConfig::new(secret, Duration::from_secs(600)).unwrap(),
        ))
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    async fn whoami(CurrentUserName(name): CurrentUserName) -> String {
        name
    }

    // Reports "anonymous" instead of rejecting, so tests can see missing claims
    struct CurrentUserName(String);

    #[async_trait]
    impl<S: Send + Sync> FromRequestParts<S> for CurrentUserName {
        type Rejection = std::convert::Infallible;

        async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
            Ok(CurrentUserName(
                parts
                    .extensions
                    .get::<IdentityClaims>()
                    .map(|c| c.username.clone())
                    .unwrap_or_else(|| "anonymous".to_string()),
            ))
        }
    }

    fn request(auth: Option<&str>) -> Request {
        let mut req = Request::builder()
            .uri("/api/v1/auth/me")
            .body(Body::empty())
            .unwrap();
        if let Some(value) = auth {
            req.headers_mut()
                .insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        req
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_required_auth_attaches_claims() {
        let jwt = jwt("middleware-secret");
        let token = jwt.issue(&test_user(), Utc::now()).unwrap();
        let handler = Authenticate::new(jwt).wrap(endpoint(whoami, ()));

        let response = handler.call(request(Some(&format!("Bearer {}", token)))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "testuser");
    }

    #[tokio::test]
    async fn test_required_auth_rejects_uniformly() {
        let jwt_a = jwt("secret-a");
        let jwt_b = jwt("secret-b");
        let forged = jwt_b.issue(&test_user(), Utc::now()).unwrap();
        let expired = jwt_a
            .issue(&test_user(), Utc::now() - chrono::Duration::hours(1))
            .unwrap();

        let handler = Authenticate::new(jwt_a).wrap(endpoint(whoami, ()));

        let mut bodies = Vec::new();
        for auth in [
            None,
            Some("Bearer not-a-token".to_string()),
            Some(format!("Bearer {}", forged)),
            Some(format!("Bearer {}", expired)),
        ] {
            let response = handler.call(request(auth.as_deref())).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            bodies.push(body_string(response).await);
        }

        // Missing, malformed, forged and expired are indistinguishable
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert!(bodies[0].contains("Unauthenticated"));
    }

    #[tokio::test]
    async fn test_rejection_message_follows_encoded_locale() {
        let handler = Authenticate::new(jwt("locale-secret")).wrap(endpoint(whoami, ()));
        let req = Request::builder()
            .uri("/api/v1/auth/me?locale=%76%69")
            .body(Body::empty())
            .unwrap();

        let response = handler.call(req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response)
            .await
            .contains("Phiên đăng nhập không hợp lệ hoặc đã hết hạn"));
    }

    #[tokio::test]
    async fn test_current_user_without_middleware_is_unauthenticated() {
        async fn me(CurrentUser(claims): CurrentUser) -> String {
            claims.username
        }

        let response = endpoint(me, ()).call(request(None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
