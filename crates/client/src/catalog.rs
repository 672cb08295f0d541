//! Public catalog reads: categories, products and banners.

use std::sync::Arc;

use loomline_core::ProductId;

use crate::cache::{QueryClient, QueryKey};
use crate::error::ClientError;
use crate::models::{Banner, Category, CategoryWithProducts, Product, ProductQuery};
use crate::transport::{Transport, fetch_get};

pub struct CatalogService<'a, T> {
    cache: &'a QueryClient,
    transport: &'a Arc<T>,
}

impl<'a, T: Transport> CatalogService<'a, T> {
    pub const fn new(cache: &'a QueryClient, transport: &'a Arc<T>) -> Self {
        Self { cache, transport }
    }

    async fn get<R: serde::de::DeserializeOwned>(&self, key: QueryKey) -> Result<R, ClientError> {
        self.cache
            .read_as(&key, || fetch_get(self.transport, &key))
            .await
    }

    /// # Errors
    ///
    /// Transport and server errors.
    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.get(QueryKey::new("categories")).await
    }

    /// # Errors
    ///
    /// [`ClientError::NotFound`] for an unknown slug.
    pub async fn category(&self, slug: &str) -> Result<CategoryWithProducts, ClientError> {
        self.get(QueryKey::new(format!("categories/{slug}"))).await
    }

    /// # Errors
    ///
    /// Transport and server errors.
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ClientError> {
        self.get(product_list_key(query)).await
    }

    /// # Errors
    ///
    /// [`ClientError::NotFound`] for an unknown product.
    pub async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        self.get(QueryKey::new(format!("products/{id}"))).await
    }

    /// Banners for one placement (e.g. `hero`), in display order.
    ///
    /// # Errors
    ///
    /// Transport and server errors.
    pub async fn banners(&self, placement: &str) -> Result<Vec<Banner>, ClientError> {
        self.get(QueryKey::new("banners").with_param("placement", placement))
            .await
    }
}

fn product_list_key(query: &ProductQuery) -> QueryKey {
    let mut key = QueryKey::new("products");
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        key = key.with_param("category", category);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        key = key.with_param("q", search);
    }
    if let Some(limit) = query.limit {
        key = key.with_param("limit", limit);
    }
    if let Some(offset) = query.offset {
        key = key.with_param("offset", offset);
    }
    key
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    #[test]
    fn test_product_list_key_skips_blank_filters() {
        let key = product_list_key(&ProductQuery {
            category: Some("kurtas".to_owned()),
            search: Some("   ".to_owned()),
            limit: Some(24),
            offset: None,
        });
        assert_eq!(key.endpoint(), "/api/products?category=kurtas&limit=24");
        assert_eq!(
            product_list_key(&ProductQuery::default()).endpoint(),
            "/api/products"
        );
    }

    #[tokio::test]
    async fn test_banners_by_placement() {
        let cache = QueryClient::default();
        let transport = Arc::new(FakeTransport::new());
        transport.reply(
            Method::GET,
            "/api/banners?placement=hero",
            Ok(json!([{
                "id": 1,
                "placement": "hero",
                "title": "Festive collection",
                "description": "",
                "desktopImageUrl": "https://cdn.loomline.in/b/1-d.jpg",
                "mobileImageUrl": "https://cdn.loomline.in/b/1-m.jpg",
                "linkUrl": null,
                "position": 0
            }])),
        );

        let banners = CatalogService::new(&cache, &transport)
            .banners("hero")
            .await
            .unwrap();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].title, "Festive collection");
    }
}
