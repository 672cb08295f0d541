//! Watchlist routes.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use loomline_core::ProductId;

use crate::db::WatchlistRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::ProductSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRequest {
    pub product_id: ProductId,
}

/// GET /api/watchlist
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ProductSummary>>> {
    Ok(Json(WatchlistRepository::new(state.pool()).list(user.id).await?))
}

/// Save a product. Idempotent.
///
/// POST /api/watchlist
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<WatchRequest>,
) -> Result<Json<Vec<ProductSummary>>> {
    let watchlist = WatchlistRepository::new(state.pool());
    watchlist.add(user.id, req.product_id).await?;
    Ok(Json(watchlist.list(user.id).await?))
}

/// DELETE /api/watchlist/{productId}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ProductSummary>>> {
    let watchlist = WatchlistRepository::new(state.pool());
    watchlist.remove(user.id, product_id).await?;
    Ok(Json(watchlist.list(user.id).await?))
}
