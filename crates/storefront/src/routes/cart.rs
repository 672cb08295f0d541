//! Cart routes.
//!
//! Every mutation answers with the updated, priced cart so the client can
//! store it without another round trip.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use loomline_core::ProductId;

use crate::db::{CartRepository, MAX_LINE_QUANTITY};
use crate::error::{AppError, Result};
use crate::middleware::RequireCheckout;
use crate::models::CartView;
use crate::services::CheckoutService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

fn check_quantity(quantity: u32) -> Result<()> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "Quantity can't exceed {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

async fn priced_cart(state: &AppState, user_id: loomline_core::UserId) -> Result<Json<CartView>> {
    let view = CheckoutService::new(state.pool(), &state.config().pricing)
        .cart(user_id)
        .await?;
    Ok(Json(view))
}

/// GET /api/cart
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireCheckout(user): RequireCheckout,
) -> Result<Json<CartView>> {
    priced_cart(&state, user.id).await
}

/// Add units of a product, merging with an existing line.
///
/// POST /api/cart/items
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireCheckout(user): RequireCheckout,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    if req.quantity == 0 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_owned()));
    }
    check_quantity(req.quantity)?;

    CartRepository::new(state.pool())
        .add(user.id, req.product_id, req.quantity)
        .await?;

    priced_cart(&state, user.id).await
}

/// Set a line's quantity; zero removes it.
///
/// PUT /api/cart/items/{productId}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireCheckout(user): RequireCheckout,
    Path(product_id): Path<ProductId>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    check_quantity(req.quantity)?;

    CartRepository::new(state.pool())
        .set_quantity(user.id, product_id, req.quantity)
        .await?;

    priced_cart(&state, user.id).await
}

/// DELETE /api/cart/items/{productId}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireCheckout(user): RequireCheckout,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;

    priced_cart(&state, user.id).await
}

/// DELETE /api/cart
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireCheckout(user): RequireCheckout,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool()).clear(user.id).await?;

    priced_cart(&state, user.id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_cap() {
        assert!(check_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            check_quantity(MAX_LINE_QUANTITY + 1),
            Err(AppError::BadRequest(_))
        ));
    }
}
