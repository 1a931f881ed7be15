//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (catalog loaded)
//!
//! # Auth (rate limited per client)
//! POST /api/auth/login                 - Verify credentials, open a session
//! POST /api/auth/logout                - End the session
//! GET  /api/auth/me                    - Caller identity
//!
//! # Catalog
//! GET  /api/products?sort=az           - Product listing (az, za, lohi, hilo)
//! GET  /api/products/{id}              - Product detail
//!
//! # Cart (requires auth)
//! GET    /api/cart                     - Priced cart
//! POST   /api/cart/items               - Add a product
//! PATCH  /api/cart/items/{productId}   - Set a line's quantity
//! DELETE /api/cart/items/{productId}   - Take one unit out
//! PUT    /api/cart/order               - Reorder lines
//! POST   /api/cart/coupon              - Apply a coupon
//! DELETE /api/cart/coupon              - Remove the coupon
//!
//! # Checkout (requires auth)
//! POST /api/checkout                   - Place an order
//! GET  /api/orders                     - Caller's order history
//! GET  /api/orders/last                - Session's last order
//!
//! # Admin (requires admin role)
//! GET    /api/admin/users              - List accounts
//! POST   /api/admin/users              - Create an account
//! DELETE /api/admin/users/{username}   - Delete an account
//! POST   /api/admin/products           - Create a product
//! DELETE /api/admin/products/{id}      - Delete a product
//! PUT    /api/admin/products/{id}/stock - Set stock
//! GET    /api/admin/orders             - All orders
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::{api_rate_limit, auth_rate_limit};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
        .route("/order", put(cart::reorder))
        .route(
            "/coupon",
            post(cart::apply_coupon).delete(cart::remove_coupon),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::history))
        .route("/last", get(checkout::last))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/users/{username}", delete(admin::delete_user))
        .route("/products", post(admin::create_product))
        .route("/products/{id}", delete(admin::delete_product))
        .route("/products/{id}/stock", put(admin::set_stock))
        .route("/orders", get(admin::list_orders))
}

/// Create all `/api` routes.
///
/// With rate limiting enabled, auth routes are charged to the auth scope and
/// everything else to the per-tier API scope.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let mut auth = auth_routes();
    let mut api = Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes());

    if state.config().rate_limit.enabled {
        auth = auth.layer(from_fn_with_state(state.clone(), auth_rate_limit));
        api = api.layer(from_fn_with_state(state.clone(), api_rate_limit));
    }

    Router::new().nest("/auth", auth).merge(api)
}

/// Create all routes for the server.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes(state))
        .fallback(not_found)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running.
async fn health() -> &'static str {
    "ok"
}

/// Readiness response.
#[derive(Serialize)]
struct Readiness {
    status: &'static str,
    products: usize,
    users: usize,
}

/// Readiness health check endpoint.
///
/// Reports the catalog and account counts; 503 if the catalog is empty.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let products = state.shop().catalog().len();
    let users = state.users().len();
    let (status, label) = if products == 0 {
        (StatusCode::SERVICE_UNAVAILABLE, "empty")
    } else {
        (StatusCode::OK, "ok")
    };
    (
        status,
        Json(Readiness {
            status: label,
            products,
            users,
        }),
    )
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}
