//! Seeded accounts with behavior quirks.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use practice_shop_core::catalog::BROKEN_IMAGE_REF;
use practice_shop_integration_tests::TestApp;
use serde_json::json;

fn customer() -> serde_json::Value {
    json!({ "firstName": "Grace", "lastName": "Hopper", "postalCode": "20500" })
}

#[tokio::test]
async fn test_problem_user_gets_broken_images() {
    let app = TestApp::new();
    let token = app.login("problem_user").await;

    let listing = app.get("/api/products", Some(&token)).await;
    for product in listing.body.as_array().unwrap() {
        assert_eq!(product["imageRef"], BROKEN_IMAGE_REF);
    }
    let detail = app.get("/api/products/3", Some(&token)).await;
    assert_eq!(detail.body["imageRef"], BROKEN_IMAGE_REF);

    let anonymous = app.get("/api/products/3", None).await;
    assert_eq!(anonymous.body["imageRef"], "/static/img/fleece-jacket.jpg");
}

#[tokio::test]
async fn test_error_user_checkout_fails_without_side_effects() {
    let app = TestApp::new();
    let token = app.login("error_user").await;

    app.post(
        "/api/cart/items",
        Some(&token),
        json!({ "productId": 5, "quantity": 2 }),
    )
    .await;

    let failed = app.post("/api/checkout", Some(&token), customer()).await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(failed.body["error"], "INJECTED_FAILURE");

    let cart = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart.body["itemCount"], 2);
    let product = app.get("/api/products/5", None).await;
    assert_eq!(product.body["available"], 25);
    let history = app.get("/api/orders", Some(&token)).await;
    assert!(history.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_user_checkout_waits_and_retries_safely() {
    let app = TestApp::with_vars(&[("SHOP_FAILURE_DELAY_MS", "50")]);
    let token = app.login("error_user").await;

    app.post(
        "/api/cart/items",
        Some(&token),
        json!({ "productId": 1, "quantity": 3 }),
    )
    .await;

    for _ in 0..2 {
        let started = Instant::now();
        let failed = app.post("/api/checkout", Some(&token), customer()).await;
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.body["error"], "INJECTED_FAILURE");

        let cart = app.get("/api/cart", Some(&token)).await;
        assert_eq!(cart.body["itemCount"], 3);
        let product = app.get("/api/products/1", None).await;
        assert_eq!(product.body["available"], 25);
        assert!(app.state.shop().all_orders().is_empty());
    }
}

#[tokio::test]
async fn test_error_user_validation_still_wins() {
    let app = TestApp::new();
    let token = app.login("error_user").await;

    let empty = app.post("/api/checkout", Some(&token), customer()).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["error"], "EMPTY_CART");
}

#[tokio::test]
async fn test_performance_glitch_user_is_slow() {
    let app = TestApp::with_vars(&[("SHOP_SLOW_DELAY_MS", "60")]);

    let started = Instant::now();
    let token = app.login("performance_glitch_user").await;
    assert!(started.elapsed() >= Duration::from_millis(60));

    let started = Instant::now();
    let listing = app.get("/api/products", Some(&token)).await;
    assert_eq!(listing.status, StatusCode::OK);
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_standard_user_is_not_delayed() {
    let app = TestApp::with_vars(&[("SHOP_SLOW_DELAY_MS", "2000")]);

    let started = Instant::now();
    let token = app.login("standard_user").await;
    app.get("/api/products", Some(&token)).await;
    assert!(started.elapsed() < Duration::from_millis(2000));
}
