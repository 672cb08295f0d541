//! Order placement.

use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;

use loomline_core::OrderId;

use crate::cache::{QueryClient, QueryKey, keys};
use crate::cart::CartService;
use crate::error::ClientError;
use crate::models::{CartView, Order};
use crate::transport::{Transport, decode};

pub struct CheckoutService<'a, T> {
    cache: &'a QueryClient,
    transport: &'a Arc<T>,
}

impl<'a, T: Transport> CheckoutService<'a, T> {
    pub const fn new(cache: &'a QueryClient, transport: &'a Arc<T>) -> Self {
        Self { cache, transport }
    }

    /// Turn the cart into an order awaiting UPI payment.
    ///
    /// An empty cart fails before anything is sent to the server. On success
    /// the cart entry becomes empty and every `orders` entry is dropped
    /// before this returns.
    ///
    /// # Errors
    ///
    /// [`ClientError::EmptyCart`] if there is nothing to order,
    /// [`ClientError::Unauthorized`] without a session.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<OrderId, ClientError> {
        let cart = CartService::new(self.cache, self.transport).cart().await?;
        if cart.is_empty() {
            return Err(ClientError::EmptyCart);
        }

        let value = match self
            .transport
            .request(Method::POST, "/api/orders", None)
            .await
        {
            Ok(value) => value,
            Err(ClientError::EmptyCart) => {
                // Emptied elsewhere since it was read.
                self.cache.invalidate(&QueryKey::new(keys::CART)).await;
                return Err(ClientError::EmptyCart);
            }
            Err(e) => return Err(e),
        };
        let order: Order = decode(&value)?;

        self.cache
            .write(
                &QueryKey::new(keys::CART),
                serde_json::to_value(CartView::default())?,
            )
            .await;
        self.cache.invalidate_prefix(keys::ORDERS).await;
        self.cache.write(&keys::order(order.id), value).await;

        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeTransport, fixtures};

    #[tokio::test]
    async fn test_empty_cart_sends_no_mutation() {
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport.reply(Method::GET, "/api/cart", Ok(fixtures::cart(&[])));

        let err = CheckoutService::new(&cache, &transport)
            .place_order()
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::EmptyCart);
        assert!(
            transport
                .calls()
                .iter()
                .all(|(method, _)| *method == Method::GET)
        );
    }

    #[tokio::test]
    async fn test_place_order_resets_cart_and_orders() {
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport
            .reply(Method::GET, "/api/cart", Ok(fixtures::cart(&[(4, 500, 2)])))
            .reply(
                Method::POST,
                "/api/orders",
                Ok(fixtures::order(31, "pending_payment", "Pending Payment")),
            );
        cache.write(&QueryKey::new(keys::ORDERS), json!([])).await;

        let id = CheckoutService::new(&cache, &transport)
            .place_order()
            .await
            .unwrap();

        assert_eq!(id, OrderId::new(31));
        assert_eq!(transport.count(&Method::POST, "/api/orders"), 1);

        let cart: CartView =
            serde_json::from_value((*cache.peek(&QueryKey::new(keys::CART)).await.unwrap()).clone())
                .unwrap();
        assert!(cart.is_empty());
        assert!(cache.peek(&QueryKey::new(keys::ORDERS)).await.is_none());
        assert!(cache.peek(&keys::order(id)).await.is_some());
    }

    #[tokio::test]
    async fn test_server_side_empty_cart() {
        // The cart emptied in another tab after it was read here.
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport
            .reply(Method::GET, "/api/cart", Ok(fixtures::cart(&[(4, 500, 1)])))
            .reply(
                Method::POST,
                "/api/orders",
                Err(ClientError::from_response(
                    422,
                    r#"{"message":"Your cart is empty","code":"empty_cart"}"#,
                )),
            );

        let err = CheckoutService::new(&cache, &transport)
            .place_order()
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::EmptyCart);
        assert!(cache.peek(&QueryKey::new(keys::CART)).await.is_none());
    }
}
