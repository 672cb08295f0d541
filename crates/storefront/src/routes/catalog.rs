//! Public catalog routes: categories, products and banners.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use loomline_core::ProductId;

use crate::db::products::ProductFilter;
use crate::db::{BannerRepository, CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Banner, Category, CategoryWithProducts, Product};
use crate::state::AppState;

/// Default page size for product listings.
const DEFAULT_PAGE_SIZE: i64 = 24;

/// Largest page a client may request.
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Free-text search over name and description.
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductListQuery {
    fn filter(&self) -> ProductFilter<'_> {
        ProductFilter {
            category_slug: self.category.as_deref().filter(|s| !s.is_empty()),
            search: self.q.as_deref(),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BannerQuery {
    pub placement: Option<String>,
}

/// GET /api/categories
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// A category and its products.
///
/// GET /api/categories/{slug}
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryWithProducts>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {slug} not found")))?;

    let products = ProductRepository::new(state.pool())
        .list_by_category(category.id)
        .await?;

    Ok(Json(CategoryWithProducts { category, products }))
}

/// GET /api/products?category=&q=&limit=&offset=
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(&query.filter())
        .await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}

/// GET /api/banners?placement=hero
#[instrument(skip(state))]
pub async fn banners(
    State(state): State<AppState>,
    Query(query): Query<BannerQuery>,
) -> Result<Json<Vec<Banner>>> {
    let placement = query.placement.as_deref().filter(|p| !p.is_empty());
    Ok(Json(BannerRepository::new(state.pool()).list(placement).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_query_defaults() {
        let query = ProductListQuery::default();
        let filter = query.filter();
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.offset, 0);
        assert!(filter.category_slug.is_none());
    }

    #[test]
    fn test_product_query_clamps() {
        let query = ProductListQuery {
            category: Some(String::new()),
            q: None,
            limit: Some(10_000),
            offset: Some(-5),
        };
        let filter = query.filter();
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.offset, 0);
        assert!(filter.category_slug.is_none());

        let query = ProductListQuery {
            limit: Some(0),
            ..ProductListQuery::default()
        };
        assert_eq!(query.filter().limit, 1);
    }
}
