//! Saved products.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::instrument;

use loomline_core::ProductId;

use crate::cache::{QueryClient, QueryKey, keys};
use crate::error::ClientError;
use crate::models::ProductSummary;
use crate::transport::{Transport, decode, fetch_get};

pub struct WatchlistService<'a, T> {
    cache: &'a QueryClient,
    transport: &'a Arc<T>,
}

impl<'a, T: Transport> WatchlistService<'a, T> {
    pub const fn new(cache: &'a QueryClient, transport: &'a Arc<T>) -> Self {
        Self { cache, transport }
    }

    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn list(&self) -> Result<Vec<ProductSummary>, ClientError> {
        let key = QueryKey::new(keys::WATCHLIST);
        self.cache
            .read_as(&key, || fetch_get(self.transport, &key))
            .await
    }

    /// Save a product. Saving it twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] for an unknown product.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId) -> Result<Vec<ProductSummary>, ClientError> {
        self.mutate(
            Method::POST,
            "/api/watchlist".to_owned(),
            Some(json!({ "productId": product_id })),
        )
        .await
    }

    /// # Errors
    ///
    /// Transport and server errors.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<Vec<ProductSummary>, ClientError> {
        self.mutate(Method::DELETE, format!("/api/watchlist/{product_id}"), None)
            .await
    }

    /// Whether a product is saved, from the cached list when there is one.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn contains(&self, product_id: ProductId) -> Result<bool, ClientError> {
        let products = match self.cache.peek(&QueryKey::new(keys::WATCHLIST)).await {
            Some(value) => decode::<Vec<ProductSummary>>(&value)?,
            None => self.list().await?,
        };
        Ok(products.iter().any(|p| p.id == product_id))
    }

    async fn mutate(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<Vec<ProductSummary>, ClientError> {
        let value = self.transport.request(method, &path, body).await?;
        let products = decode(&value)?;
        self.cache.write(&QueryKey::new(keys::WATCHLIST), value).await;
        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;

    fn saved(ids: &[i64]) -> Value {
        ids.iter()
            .map(|id| json!({"id": id, "name": format!("Saree {id}"), "price": "1500.00", "image": null}))
            .collect()
    }

    #[tokio::test]
    async fn test_add_then_contains_uses_cached_list() {
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport.reply(Method::POST, "/api/watchlist", Ok(saved(&[8])));

        let watchlist = WatchlistService::new(&cache, &transport);
        watchlist.add(ProductId::new(8)).await.unwrap();

        assert!(watchlist.contains(ProductId::new(8)).await.unwrap());
        assert!(!watchlist.contains(ProductId::new(9)).await.unwrap());
        assert_eq!(transport.count(&Method::GET, "/api/watchlist"), 0);
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport.reply(Method::DELETE, "/api/watchlist/8", Ok(saved(&[])));

        let list = WatchlistService::new(&cache, &transport)
            .remove(ProductId::new(8))
            .await
            .unwrap();
        assert!(list.is_empty());
    }
}
