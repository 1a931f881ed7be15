//! Rate limiting middleware.
//!
//! Provides two layers backed by the shop's fixed-window limiter:
//! - `auth_rate_limit`: strict limit for login (~10/min per client)
//! - `api_rate_limit`: per-tier limit for everything else under `/api`
//!   (anonymous < authenticated < admin)
//!
//! Clients are keyed by IP address. Refused requests get a 429 with a
//! `Retry-After` header.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use practice_shop_core::{RateScope, Tier};

use crate::error::AppError;
use crate::middleware::auth::bearer_token;
use crate::state::AppState;

/// Key used when no client address can be determined.
const UNKNOWN_CLIENT: &str = "unknown";

// =============================================================================
// Client IP Extraction for Cloudflare + Fly.io
// =============================================================================

/// Extract the client IP, checking Cloudflare's `CF-Connecting-IP` header
/// first, then standard proxy headers.
#[must_use]
pub fn client_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    // Try CF-Connecting-IP first (Cloudflare's real client IP)
    if let Some(ip) = headers
        .get("cf-connecting-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    // Try X-Forwarded-For (first IP in the chain)
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    // Try X-Real-IP, then Fly-Client-IP (Fly.io's header)
    ["x-real-ip", "fly-client-ip"].into_iter().find_map(|name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

/// Rate limit key for a request: proxy headers, then the peer address.
fn client_key(request: &Request) -> String {
    client_ip_from_headers(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), |ip| ip.to_string())
}

async fn check(state: &AppState, scope: RateScope, request: Request, next: Next) -> Response {
    let tier = match bearer_token(request.headers()) {
        Some(token) => Tier::of(state.shop().resolve(&token).await.as_ref()),
        None => Tier::Anonymous,
    };
    let key = client_key(&request);

    match state.shop().rate_limiter().check(scope, tier, &key) {
        Ok(()) => next.run(request).await,
        Err(err) => AppError::from(err).into_response(),
    }
}

/// Rate limit authentication endpoints.
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    check(&state, RateScope::Auth, request, next).await
}

/// Rate limit general API endpoints by caller tier.
pub async fn api_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    check(&state, RateScope::Api, request, next).await
}
