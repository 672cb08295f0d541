//! Customer order routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use loomline_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAuth, RequireCheckout};
use crate::models::Order;
use crate::services::CheckoutService;
use crate::state::AppState;

/// Place an order from the cart.
///
/// POST /api/orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireCheckout(user): RequireCheckout,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutService::new(state.pool(), &state.config().pricing)
        .place_order(user.id)
        .await?;

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));

    Ok((StatusCode::CREATED, Json(order)))
}

/// The user's orders, newest first.
///
/// GET /api/orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// One order. Visible to its owner and to admins; everyone else gets 404.
///
/// GET /api/orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let mut order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|o| o.user_id == user.id || user.role.is_admin())
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    if !user.role.is_admin() {
        order.customer = None;
    }

    Ok(Json(order))
}
