//! Admin routes: accounts, catalog and orders.
//!
//! Every handler takes `RequireAdmin`; customers get 403.

use axum::{Json, extract::State, http::StatusCode};
use practice_shop_core::{NewProduct, Order, Product, ProductId, ProductListing};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::auth::{NewUser, UserSummary};
use crate::state::AppState;

/// Create product request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_ref: String,
    #[serde(default)]
    pub stock: i64,
}

/// Set stock request body.
#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub quantity: i64,
}

/// Stock after an update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: ProductId,
    pub available: u32,
}

/// All accounts.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Json<Vec<UserSummary>> {
    Json(state.users().list())
}

/// Create an account.
#[instrument(skip(state, admin, new), fields(admin = %admin.identity.username))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(new): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<UserSummary>)> {
    let verifier = state.clone();
    let user = tokio::task::spawn_blocking(move || verifier.users().create(new))
        .await
        .map_err(|e| AppError::Internal(format!("create user task failed: {e}")))??;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Delete an account and end its sessions.
#[instrument(skip(state, admin), fields(admin = %admin.identity.username))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(username): ApiPath<String>,
) -> Result<StatusCode> {
    state.users().delete(&username)?;
    let closed = state.shop().close_sessions_for(&username).await;
    info!(%username, closed, "user sessions closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Create a product.
#[instrument(skip(state, admin, body), fields(admin = %admin.identity.username))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductListing>)> {
    let listing = state.shop().create_product(
        NewProduct {
            name: body.name,
            description: body.description,
            price: body.price,
            image_ref: body.image_ref,
        },
        body.stock,
    )?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Delete a product no cart refers to.
#[instrument(skip(state, admin), fields(admin = %admin.identity.username))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<u32>,
) -> Result<Json<Product>> {
    Ok(Json(state.shop().delete_product(ProductId::new(id)).await?))
}

/// Override a product's stock.
#[instrument(skip(state, admin), fields(admin = %admin.identity.username))]
pub async fn set_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<u32>,
    ApiJson(body): ApiJson<SetStockRequest>,
) -> Result<Json<StockLevel>> {
    let product_id = ProductId::new(id);
    let available = state.shop().set_stock(product_id, body.quantity).await?;
    Ok(Json(StockLevel {
        product_id,
        available,
    }))
}

/// Every order placed since startup.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Json<Vec<Order>> {
    Json(state.shop().all_orders())
}
