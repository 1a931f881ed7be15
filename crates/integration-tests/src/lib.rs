//! Integration tests for Practice Shop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p practice-shop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `engine` - Concurrency and atomicity of the commerce engine, no HTTP
//! - `http_api` - The axum router driven in-process with `tower::ServiceExt`
//! - `behaviors` - Seeded accounts with behavior quirks
//!
//! [`TestApp`] builds the full router over a fresh shop with zero injected
//! latency, rate limiting off and cheap password hashing.

#![allow(clippy::missing_panics_doc)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use practice_shop_server::config::ShopConfig;
use practice_shop_server::services::auth::HashCost;
use practice_shop_server::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

/// Password of every seeded account in tests.
pub const SEED_PASSWORD: &str = "secret_sauce";

/// Variables every test app starts from; later entries override earlier ones.
const BASE_VARS: &[(&str, &str)] = &[
    ("SHOP_SEED_PASSWORD", SEED_PASSWORD),
    ("SHOP_SLOW_DELAY_MS", "0"),
    ("SHOP_FAILURE_DELAY_MS", "0"),
    ("SHOP_RATE_LIMIT_ENABLED", "false"),
];

/// A response with its body decoded.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body; plain text bodies become a JSON string, empty bodies null.
    pub body: Value,
}

/// The full application over a fresh shop.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App with test defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    /// App with extra configuration variables.
    #[must_use]
    pub fn with_vars(overrides: &[(&str, &str)]) -> Self {
        let vars: Vec<(String, String)> = BASE_VARS
            .iter()
            .chain(overrides)
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = ShopConfig::from_vars(|key| {
            vars.iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("test configuration is valid");

        let state = AppState::new(config, HashCost::Minimal).expect("seed data is valid");
        let router = practice_shop_server::app(state.clone());
        Self { state, router }
    }

    /// Send a request and decode the response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("request is valid")).await
    }

    /// Send a prepared request and decode the response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, path, token, Some(body)).await
    }

    /// Log in with the seed password and return the bearer token.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                serde_json::json!({ "username": username, "password": SEED_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        response.body["token"]
            .as_str()
            .expect("token is a string")
            .to_string()
    }
}
