//! Cart reads and mutations.
//!
//! Every mutation answers with the whole priced cart; that answer replaces
//! the cached `cart` entry and detaches any read still in flight.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::instrument;

use loomline_core::ProductId;

use crate::cache::{QueryClient, QueryKey, keys};
use crate::error::ClientError;
use crate::models::CartView;
use crate::transport::{Transport, decode, fetch_get};

pub struct CartService<'a, T> {
    cache: &'a QueryClient,
    transport: &'a Arc<T>,
}

impl<'a, T: Transport> CartService<'a, T> {
    pub const fn new(cache: &'a QueryClient, transport: &'a Arc<T>) -> Self {
        Self { cache, transport }
    }

    /// The current user's priced cart.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn cart(&self) -> Result<CartView, ClientError> {
        let key = QueryKey::new(keys::CART);
        self.cache
            .read_as(&key, || fetch_get(self.transport, &key))
            .await
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a zero quantity,
    /// [`ClientError::NotFound`] for an unknown product.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<CartView, ClientError> {
        let body = json!({ "productId": product_id, "quantity": quantity });
        self.mutate(Method::POST, "/api/cart/items".to_owned(), Some(body))
            .await
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] if the product is not in the cart.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartView, ClientError> {
        self.mutate(
            Method::PUT,
            format!("/api/cart/items/{product_id}"),
            Some(json!({ "quantity": quantity })),
        )
        .await
    }

    /// # Errors
    ///
    /// Transport and server errors.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<CartView, ClientError> {
        self.mutate(Method::DELETE, format!("/api/cart/items/{product_id}"), None)
            .await
    }

    /// # Errors
    ///
    /// Transport and server errors.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartView, ClientError> {
        self.mutate(Method::DELETE, "/api/cart".to_owned(), None).await
    }

    async fn mutate(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<CartView, ClientError> {
        let value = self.transport.request(method, &path, body).await?;
        let cart: CartView = decode(&value)?;
        self.cache.write(&QueryKey::new(keys::CART), value).await;
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use loomline_core::Money;

    use super::*;
    use crate::testing::{FakeTransport, fixtures};

    #[tokio::test]
    async fn test_add_posts_and_stores_response() {
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport.reply(Method::POST, "/api/cart/items", Ok(fixtures::cart(&[(4, 500, 2)])));

        let cart = CartService::new(&cache, &transport)
            .add(ProductId::new(4), 2)
            .await
            .unwrap();

        assert_eq!(cart.totals.total, Money::from_major(1280));
        assert_eq!(
            transport.body_of(&Method::POST, "/api/cart/items"),
            Some(json!({"productId": 4, "quantity": 2}))
        );
        let stored = cache.peek(&QueryKey::new(keys::CART)).await.unwrap();
        assert_eq!(*stored, fixtures::cart(&[(4, 500, 2)]));
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes_line() {
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport.reply(Method::PUT, "/api/cart/items/4", Ok(fixtures::cart(&[])));

        let cart = CartService::new(&cache, &transport)
            .set_quantity(ProductId::new(4), 0)
            .await
            .unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.totals.total, Money::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_response_beats_slow_read() {
        let cache = Arc::new(QueryClient::default());
        let transport = Arc::new(FakeTransport::with_latency(Duration::from_millis(100)));
        transport
            .reply(Method::GET, "/api/cart", Ok(fixtures::cart(&[(4, 500, 1)])))
            .reply(Method::DELETE, "/api/cart", Ok(fixtures::cart(&[])));

        let read = {
            let cache = Arc::clone(&cache);
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { CartService::new(&cache, &transport).cart().await })
        };
        tokio::task::yield_now().await;
        CartService::new(&cache, &transport).clear().await.unwrap();
        read.await.unwrap().unwrap();

        let stored = cache.peek(&QueryKey::new(keys::CART)).await.unwrap();
        assert_eq!(*stored, fixtures::cart(&[]));
    }
}
