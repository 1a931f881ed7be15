//! Authentication extractors.
//!
//! Clients authenticate with `Authorization: Bearer <token>`, where the token
//! was returned by `POST /api/auth/login`. The token is resolved against the
//! shop's live sessions on every request.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use practice_shop_core::{Identity, SessionToken};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// A resolved session: the caller's token and identity.
#[derive(Debug, Clone)]
pub struct Caller {
    pub token: SessionToken,
    pub identity: Identity,
}

/// Extract the bearer token from the `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| SessionToken::from_client(token))
}

async fn resolve_caller(parts: &Parts, state: &AppState) -> Option<Caller> {
    let token = bearer_token(&parts.headers)?;
    let identity = state.shop().resolve(&token).await?;
    Span::current().record("username", identity.username.as_str());
    set_sentry_user(&identity.username);
    Some(Caller { token, identity })
}

/// Extractor that requires a live session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(caller): RequireAuth) -> String {
///     format!("Hello, {}!", caller.identity.username)
/// }
/// ```
pub struct RequireAuth(pub Caller);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_caller(parts, state)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("missing or invalid session token".to_string()))
    }
}

/// Extractor that requires a live admin session.
pub struct RequireAdmin(pub Caller);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(caller) = RequireAuth::from_request_parts(parts, state).await?;
        if !caller.identity.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(Self(caller))
    }
}

/// Extractor that optionally resolves the caller.
///
/// Unlike `RequireAuth`, this does not reject anonymous requests or unknown
/// tokens.
pub struct OptionalAuth(pub Option<Caller>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_caller(parts, state).await))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(authorization: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            bearer_token(&headers(Some("Bearer abc123"))).unwrap().as_str(),
            "abc123"
        );
        assert_eq!(
            bearer_token(&headers(Some("bearer   abc123 "))).unwrap().as_str(),
            "abc123"
        );
        assert!(bearer_token(&headers(Some("Basic abc123"))).is_none());
        assert!(bearer_token(&headers(Some("Bearer "))).is_none());
        assert!(bearer_token(&headers(None)).is_none());
    }
}
