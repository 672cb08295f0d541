//! Category repository.

use sqlx::PgPool;

use loomline_core::CategoryId;

use super::{RepositoryError, map_unique_violation};
use crate::models::catalog::{Category, CategoryInput};

fn slug_taken(_: Option<&str>) -> String {
    "A category with this slug already exists".to_owned()
}

/// Repository for product categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description FROM storefront.category ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description FROM storefront.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO storefront.category (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, description
            ",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, slug_taken))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            UPDATE storefront.category
            SET name = $2, slug = $3, description = $4
            WHERE id = $1
            RETURNING id, name, slug, description
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, slug_taken))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category; its products become uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
