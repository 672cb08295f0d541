//! Watchlist repository: products a user has saved for later.

use sqlx::PgPool;

use loomline_core::{ProductId, UserId};

use super::{RepositoryError, map_foreign_key_violation};
use crate::models::catalog::ProductSummary;

pub struct WatchlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WatchlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved products, most recently saved first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<ProductSummary>, RepositoryError> {
        Ok(sqlx::query_as::<_, ProductSummaryRow>(
            r"
            SELECT p.id, p.name, p.price, p.images[1] AS image
            FROM storefront.watchlist w
            JOIN storefront.product p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC, p.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
    }

    /// Save a product. Saving it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.watchlist (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(map_foreign_key_violation)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.watchlist WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProductSummaryRow {
    id: ProductId,
    name: String,
    price: loomline_core::Money,
    image: Option<String>,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(r: ProductSummaryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            price: r.price,
            image: r.image,
        }
    }
}
