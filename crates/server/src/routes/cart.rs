//! Cart routes.
//!
//! Every mutation answers with the freshly priced cart so clients never need
//! a follow-up read.

use axum::{
    Json,
    extract::State,
};
use practice_shop_core::{PricedCart, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{ApiJson, ApiPath, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: u32,
    /// Defaults to one.
    pub quantity: Option<i64>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Reorder request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub product_ids: Vec<u32>,
}

/// Apply coupon request body.
#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub code: String,
}

/// The caller's priced cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<PricedCart>> {
    Ok(Json(state.shop().cart(&caller.token).await?))
}

/// Add units of a product.
#[instrument(skip(state, caller))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<PricedCart>> {
    let cart = state
        .shop()
        .add_to_cart(&caller.token, ProductId::new(body.product_id), body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Replace a line's quantity.
#[instrument(skip(state, caller))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(product_id): ApiPath<u32>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<PricedCart>> {
    let cart = state
        .shop()
        .update_cart_quantity(&caller.token, ProductId::new(product_id), body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Take one unit of a product out of the cart.
#[instrument(skip(state, caller))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(product_id): ApiPath<u32>,
) -> Result<Json<PricedCart>> {
    let cart = state
        .shop()
        .decrement_cart_line(&caller.token, ProductId::new(product_id))
        .await?;
    Ok(Json(cart))
}

/// Reorder cart lines.
#[instrument(skip(state, caller))]
pub async fn reorder(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> Result<Json<PricedCart>> {
    let order: Vec<ProductId> = body.product_ids.into_iter().map(ProductId::new).collect();
    let cart = state.shop().reorder_cart(&caller.token, &order).await?;
    Ok(Json(cart))
}

/// Apply a coupon code.
#[instrument(skip(state, caller))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<CouponRequest>,
) -> Result<Json<PricedCart>> {
    let cart = state.shop().apply_coupon(&caller.token, &body.code).await?;
    Ok(Json(cart))
}

/// Remove the applied coupon.
#[instrument(skip_all)]
pub async fn remove_coupon(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<PricedCart>> {
    Ok(Json(state.shop().remove_coupon(&caller.token).await?))
}
