//! End-to-end tests of the HTTP API, driven in-process.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use practice_shop_integration_tests::{SEED_PASSWORD, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new();

    let live = app.get("/health", None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.get("/health/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["products"], 6);
    assert_eq!(ready.body["users"], 6);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new();
    let token = app.login("standard_user").await;

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "standard_user");
    assert_eq!(me.body["role"], "customer");
    assert_eq!(me.body["behaviorType"], "standard");
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new();

    let wrong = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "standard_user", "password": "not the password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "INVALID_CREDENTIALS");

    let unknown = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "nobody", "password": SEED_PASSWORD }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let locked = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "locked_out_user", "password": SEED_PASSWORD }),
        )
        .await;
    assert_eq!(locked.status, StatusCode::FORBIDDEN);
    assert_eq!(locked.body["error"], "LOCKED_OUT");
}

#[tokio::test]
async fn test_cart_requires_a_session() {
    let app = TestApp::new();

    let anonymous = app.get("/api/cart", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["error"], "UNAUTHORIZED");

    let forged = app.get("/api/cart", Some("not-a-session")).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_listing_sorts() {
    let app = TestApp::new();

    let listing = app.get("/api/products?sort=lohi", None).await;
    assert_eq!(listing.status, StatusCode::OK);
    let prices: Vec<&str> = listing
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_str().unwrap())
        .collect();
    assert_eq!(prices, ["7.99", "9.99", "15.99", "29.99", "39.99", "49.99"]);

    let bad = app.get("/api/products?sort=sideways", None).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["error"], "INVALID_INPUT");

    let missing = app.get("/api/products/99", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn test_cart_pricing_with_coupon() {
    let app = TestApp::new();
    let token = app.login("standard_user").await;

    let cart = app
        .post(
            "/api/cart/items",
            Some(&token),
            json!({ "productId": 0, "quantity": 3 }),
        )
        .await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["itemCount"], 3);
    assert_eq!(cart.body["itemTotal"], "29.97");
    assert_eq!(cart.body["tax"], "2.40");
    assert_eq!(cart.body["total"], "32.37");

    let discounted = app
        .post("/api/cart/coupon", Some(&token), json!({ "code": "save20" }))
        .await;
    assert_eq!(discounted.status, StatusCode::OK);
    assert_eq!(discounted.body["coupon"]["code"], "SAVE20");
    assert_eq!(discounted.body["discount"], "5.99");
    assert_eq!(discounted.body["subtotal"], "23.98");
    assert_eq!(discounted.body["total"], "25.90");

    let bogus = app
        .post("/api/cart/coupon", Some(&token), json!({ "code": "FREEMONEY" }))
        .await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);
    assert_eq!(bogus.body["error"], "INVALID_COUPON");

    let removed = app
        .request(Method::DELETE, "/api/cart/coupon", Some(&token), None)
        .await;
    assert_eq!(removed.body["discount"], "0.00");
    assert_eq!(removed.body["total"], "32.37");
}

#[tokio::test]
async fn test_cart_line_edits() {
    let app = TestApp::new();
    let token = app.login("standard_user").await;

    app.post("/api/cart/items", Some(&token), json!({ "productId": 0 }))
        .await;
    app.post("/api/cart/items", Some(&token), json!({ "productId": 4 }))
        .await;

    let updated = app
        .request(
            Method::PATCH,
            "/api/cart/items/0",
            Some(&token),
            Some(json!({ "quantity": 4 })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["lines"][0]["quantity"], 4);

    let reordered = app
        .request(
            Method::PUT,
            "/api/cart/order",
            Some(&token),
            Some(json!({ "productIds": [4, 0] })),
        )
        .await;
    assert_eq!(reordered.status, StatusCode::OK);
    assert_eq!(reordered.body["lines"][0]["productId"], 4);

    let decremented = app
        .request(Method::DELETE, "/api/cart/items/4", Some(&token), None)
        .await;
    assert_eq!(decremented.status, StatusCode::OK);
    assert_eq!(decremented.body["lines"].as_array().unwrap().len(), 1);

    let absent = app
        .request(Method::DELETE, "/api/cart/items/4", Some(&token), None)
        .await;
    assert_eq!(absent.status, StatusCode::NOT_FOUND);
    assert_eq!(absent.body["error"], "ITEM_NOT_IN_CART");

    let too_many = app
        .request(
            Method::PATCH,
            "/api/cart/items/0",
            Some(&token),
            Some(json!({ "quantity": 11 })),
        )
        .await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_insufficient_stock_reports_available() {
    let app = TestApp::new();
    let admin = app.login("admin").await;
    let token = app.login("standard_user").await;

    let stock = app
        .request(
            Method::PUT,
            "/api/admin/products/1/stock",
            Some(&admin),
            Some(json!({ "quantity": 10 })),
        )
        .await;
    assert_eq!(stock.status, StatusCode::OK);
    assert_eq!(stock.body["available"], 10);

    let first = app
        .post(
            "/api/cart/items",
            Some(&token),
            json!({ "productId": 1, "quantity": 5 }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .post(
            "/api/cart/items",
            Some(&token),
            json!({ "productId": 1, "quantity": 6 }),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["error"], "INSUFFICIENT_STOCK");
    assert_eq!(second.body["available"], 10);

    let cart = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart.body["itemCount"], 5);
}

#[tokio::test]
async fn test_checkout_flow() {
    let app = TestApp::new();
    let token = app.login("standard_user").await;

    let empty = app
        .post(
            "/api/checkout",
            Some(&token),
            json!({ "firstName": "Ada", "lastName": "Lovelace", "postalCode": "12345" }),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["error"], "EMPTY_CART");

    app.post(
        "/api/cart/items",
        Some(&token),
        json!({ "productId": 0, "quantity": 3 }),
    )
    .await;

    let missing = app
        .post(
            "/api/checkout",
            Some(&token),
            json!({ "firstName": "Ada", "lastName": "  " }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "MISSING_FIELDS");

    let none_yet = app.get("/api/orders/last", Some(&token)).await;
    assert_eq!(none_yet.status, StatusCode::NOT_FOUND);

    let order = app
        .post(
            "/api/checkout",
            Some(&token),
            json!({ "firstName": "Ada", "lastName": "Lovelace", "postalCode": "12345" }),
        )
        .await;
    assert_eq!(order.status, StatusCode::OK);
    assert_eq!(order.body["total"], "32.37");
    assert_eq!(order.body["username"], "standard_user");
    let order_id = order.body["orderId"].as_str().unwrap().to_string();

    let product = app.get("/api/products/0", None).await;
    assert_eq!(product.body["available"], 22);

    let cart = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart.body["itemCount"], 0);

    let last = app.get("/api/orders/last", Some(&token)).await;
    assert_eq!(last.body["orderId"], order_id.as_str());

    let history = app.get("/api/orders", Some(&token)).await;
    assert_eq!(history.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    let token = app.login("standard_user").await;

    let logout = app
        .request(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let after = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let app = TestApp::new();
    let token = app.login("standard_user").await;

    let users = app.get("/api/admin/users", Some(&token)).await;
    assert_eq!(users.status, StatusCode::FORBIDDEN);
    assert_eq!(users.body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_manages_products() {
    let app = TestApp::new();
    let admin = app.login("admin").await;

    let created = app
        .post(
            "/api/admin/products",
            Some(&admin),
            json!({ "name": "Water Bottle", "price": "12.50", "imageRef": "/static/img/bottle.jpg", "stock": 4 }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["id"], 6);
    assert_eq!(created.body["available"], 4);

    let shopper = app.login("standard_user").await;
    app.post("/api/cart/items", Some(&shopper), json!({ "productId": 6 }))
        .await;

    let in_use = app
        .request(Method::DELETE, "/api/admin/products/6", Some(&admin), None)
        .await;
    assert_eq!(in_use.status, StatusCode::CONFLICT);
    assert_eq!(in_use.body["error"], "PRODUCT_IN_USE");

    app.request(Method::DELETE, "/api/cart/items/6", Some(&shopper), None)
        .await;
    let deleted = app
        .request(Method::DELETE, "/api/admin/products/6", Some(&admin), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["name"], "Water Bottle");

    let gone = app.get("/api/products/6", None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let negative = app
        .request(
            Method::PUT,
            "/api/admin/products/0/stock",
            Some(&admin),
            Some(json!({ "quantity": -1 })),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = TestApp::new();
    let admin = app.login("admin").await;

    let created = app
        .post(
            "/api/admin/users",
            Some(&admin),
            json!({ "username": "new_shopper", "password": SEED_PASSWORD }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["behaviorType"], "standard");

    let duplicate = app
        .post(
            "/api/admin/users",
            Some(&admin),
            json!({ "username": "new_shopper", "password": SEED_PASSWORD }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let token = app.login("new_shopper").await;
    let deleted = app
        .request(
            Method::DELETE,
            "/api/admin/users/new_shopper",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let revoked = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(revoked.status, StatusCode::UNAUTHORIZED);

    let users = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(users.body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_admin_sees_every_order() {
    let app = TestApp::new();
    let admin = app.login("admin").await;

    for username in ["standard_user", "problem_user"] {
        let token = app.login(username).await;
        app.post("/api/cart/items", Some(&token), json!({ "productId": 2 }))
            .await;
        let order = app
            .post(
                "/api/checkout",
                Some(&token),
                json!({ "firstName": "A", "lastName": "B", "postalCode": "C" }),
            )
            .await;
        assert_eq!(order.status, StatusCode::OK);
    }

    let orders = app.get("/api/admin/orders", Some(&admin)).await;
    assert_eq!(orders.status, StatusCode::OK);
    assert_eq!(orders.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_login_rate_limited() {
    let app = TestApp::with_vars(&[
        ("SHOP_RATE_LIMIT_ENABLED", "true"),
        ("SHOP_RATE_LIMIT_AUTH", "2"),
    ]);

    for _ in 0..2 {
        let response = app
            .post(
                "/api/auth/login",
                None,
                json!({ "username": "standard_user", "password": "wrong password" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let limited = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "standard_user", "password": SEED_PASSWORD }),
        )
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "RATE_LIMITED");
    assert!(limited.headers.contains_key(header::RETRY_AFTER));

    // Other clients have their own window.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("x-forwarded-for", "198.51.100.9")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": "standard_user", "password": SEED_PASSWORD }).to_string(),
        ))
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_requests() {
    let app = TestApp::new();
    let token = app.login("standard_user").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/cart/items")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"productId\":"))
        .unwrap();
    let broken = app.send(request).await;
    assert_eq!(broken.status, StatusCode::BAD_REQUEST);
    assert_eq!(broken.body["error"], "INVALID_INPUT");

    let bad_path = app
        .request(Method::DELETE, "/api/cart/items/abc", Some(&token), None)
        .await;
    assert_eq!(bad_path.status, StatusCode::BAD_REQUEST);

    let unknown = app.get("/api/nothing-here", None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "suite-run-42")
        .body(Body::empty())
        .unwrap();
    let echoed = app.send(request).await;
    assert_eq!(echoed.headers["x-request-id"], "suite-run-42");
    assert_eq!(echoed.headers["x-content-type-options"], "nosniff");
    assert_eq!(echoed.headers["x-frame-options"], "DENY");

    let generated = app.get("/health", None).await;
    let id = generated.headers["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 36);
}
