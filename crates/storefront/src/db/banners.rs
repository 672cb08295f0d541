//! Banner repository.

use sqlx::PgPool;

use loomline_core::BannerId;

use super::RepositoryError;
use crate::models::catalog::{Banner, BannerInput};

const BANNER_COLUMNS: &str =
    "id, placement, title, description, desktop_image_url, mobile_image_url, link_url, position";

pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Banners ordered by position, optionally restricted to one placement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, placement: Option<&str>) -> Result<Vec<Banner>, RepositoryError> {
        let sql = format!(
            "SELECT {BANNER_COLUMNS} FROM storefront.banner \
             WHERE ($1::text IS NULL OR placement = $1) \
             ORDER BY placement, position, id"
        );
        Ok(sqlx::query_as::<_, Banner>(&sql)
            .bind(placement)
            .fetch_all(self.pool)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &BannerInput) -> Result<Banner, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.banner \
                 (placement, title, description, desktop_image_url, mobile_image_url, link_url, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {BANNER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Banner>(&sql)
            .bind(&input.placement)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.desktop_image_url)
            .bind(&input.mobile_image_url)
            .bind(input.link_url.as_deref())
            .bind(input.position)
            .fetch_one(self.pool)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn update(&self, id: BannerId, input: &BannerInput) -> Result<Banner, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.banner SET placement = $2, title = $3, description = $4, \
                 desktop_image_url = $5, mobile_image_url = $6, link_url = $7, position = $8 \
             WHERE id = $1 RETURNING {BANNER_COLUMNS}"
        );
        sqlx::query_as::<_, Banner>(&sql)
            .bind(id)
            .bind(&input.placement)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.desktop_image_url)
            .bind(&input.mobile_image_url)
            .bind(input.link_url.as_deref())
            .bind(input.position)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn delete(&self, id: BannerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.banner WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
