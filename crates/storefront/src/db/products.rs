//! Product repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use loomline_core::{CategoryId, ProductId};

use super::{RepositoryError, map_foreign_key_violation};
use crate::models::catalog::{Product, ProductInput};

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.images, p.category_id, p.created_at";

/// Filters for the product listing.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter<'q> {
    pub category_slug: Option<&'q str>,
    /// Case-insensitive match on name and description.
    pub search: Option<&'q str>,
    pub limit: i64,
    pub offset: i64,
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter<'_>) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p \
             LEFT JOIN storefront.category c ON c.id = p.category_id WHERE TRUE"
        ));

        if let Some(slug) = filter.category_slug {
            qb.push(" AND c.slug = ").push_bind(slug);
        }
        if let Some(search) = filter.search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        Ok(qb.build_query_as::<Product>().fetch_all(self.pool).await?)
    }

    /// Products of one category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p \
             WHERE p.category_id = $1 ORDER BY p.created_at DESC, p.id DESC"
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(category_id)
            .fetch_all(self.pool)
            .await?)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.product AS p (name, description, price, images, category_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&input.name)
            .bind(input.description.as_deref())
            .bind(input.price)
            .bind(&input.images)
            .bind(input.category_id)
            .fetch_one(self.pool)
            .await
            .map_err(map_foreign_key_violation)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or category doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.product AS p SET name = $2, description = $3, price = $4, \
                 images = $5, category_id = $6, updated_at = NOW() \
             WHERE p.id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(input.description.as_deref())
            .bind(input.price)
            .bind(&input.images)
            .bind(input.category_id)
            .fetch_optional(self.pool)
            .await
            .map_err(map_foreign_key_violation)?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Cart and watchlist entries go with it; order items
    /// keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Escape `LIKE` wildcards in user input.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("cotton"), "cotton");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
