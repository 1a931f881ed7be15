//! Checkout and order history routes.

use axum::{Json, extract::State};
use practice_shop_core::{CustomerInfo, Order};
use tracing::instrument;

use crate::error::{ApiJson, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Place an order for the caller's cart.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(customer): ApiJson<CustomerInfo>,
) -> Result<Json<Order>> {
    Ok(Json(state.shop().checkout(&caller.token, customer).await?))
}

/// Orders placed by the caller's account.
#[instrument(skip_all)]
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.shop().order_history(&caller.token).await?))
}

/// The last order placed in the caller's session.
#[instrument(skip_all)]
pub async fn last(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<Order>> {
    Ok(Json(state.shop().last_order(&caller.token).await?))
}
