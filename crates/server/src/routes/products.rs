//! Product catalog routes.

use axum::{
    Json,
    extract::{Query, State},
};
use practice_shop_core::{ProductId, ProductListing, SortMode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{ApiPath, Result};
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// One of `az`, `za`, `lohi`, `hilo`; absent keeps catalog order.
    #[serde(default)]
    pub sort: Option<String>,
}

/// List products with availability.
#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductListing>>> {
    let sort = query
        .sort
        .as_deref()
        .map_or(Ok(SortMode::None), str::parse::<SortMode>)?;
    let viewer = caller.as_ref().map(|c| &c.identity);
    Ok(Json(state.shop().list_products(viewer, sort).await))
}

/// One product with availability.
#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    ApiPath(id): ApiPath<u32>,
) -> Result<Json<ProductListing>> {
    let viewer = caller.as_ref().map(|c| &c.identity);
    let product = state.shop().product(viewer, ProductId::new(id)).await?;
    Ok(Json(product))
}
