//! Cart pricing, order placement and order status changes.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use loomline_core::{OrderId, OrderStatus, PricingPolicy, StatusTransitionError, UserId};

use crate::db::{CartCheckout, CartRepository, OrderRepository, RepositoryError, UserRepository};
use crate::models::{CartView, Order};

/// Errors from checkout and order management.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("your cart is empty")]
    EmptyCart,

    /// The requested status change isn't an edge of the order state machine.
    #[error(transparent)]
    InvalidTransition(#[from] StatusTransitionError),

    /// Order (or user) doesn't exist.
    #[error("order not found")]
    NotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    policy: &'a PricingPolicy,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: &'a PricingPolicy) -> Self {
        Self { pool, policy }
    }

    /// The user's cart priced for their current address.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotFound` if the user no longer exists.
    pub async fn cart(&self, user_id: UserId) -> Result<CartView, CheckoutError> {
        let user = UserRepository::new(self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or(CheckoutError::NotFound)?;
        let lines = CartRepository::new(self.pool).lines(user_id).await?;

        Ok(CartView::price(lines, self.policy, &user.address))
    }

    /// Turn the user's cart into a `pending_payment` order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to order.
    #[instrument(skip(self))]
    pub async fn place_order(&self, user_id: UserId) -> Result<Order, CheckoutError> {
        let placed = OrderRepository::new(self.pool)
            .place_from_cart(user_id, self.policy)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CheckoutError::NotFound,
                other => CheckoutError::Repository(other),
            })?;

        match placed {
            CartCheckout::Empty => Err(CheckoutError::EmptyCart),
            CartCheckout::Placed(order) => {
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total,
                    items = order.items.len(),
                    "Order placed"
                );
                Ok(order)
            }
        }
    }

    /// Move an order along the state machine.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` for a disallowed edge,
    /// including when another admin changed the status first.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        to: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders.get(id).await?.ok_or(CheckoutError::NotFound)?;

        let from = order.status;
        from.transition_to(to)?;

        orders.update_status(id, from, to).await.map_err(|e| match e {
            // Another status change landed first.
            RepositoryError::Conflict(_) => CheckoutError::InvalidTransition(
                StatusTransitionError { from, to },
            ),
            other => CheckoutError::Repository(other),
        })?;

        tracing::info!(order_id = %id, %from, %to, "Order status changed");

        orders.get(id).await?.ok_or(CheckoutError::NotFound)
    }
}
