//! Key/value store settings.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::RepositoryError;

pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read and decode a setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored JSON doesn't match `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        let value: Option<JsonValue> =
            sqlx::query_scalar("SELECT value FROM storefront.setting WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool)
                .await?;

        value
            .map(|v| {
                serde_json::from_value(v)
                    .map_err(|e| RepositoryError::DataCorruption(format!("setting {key}: {e}")))
            })
            .transpose()
    }

    /// Insert or replace a setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), RepositoryError> {
        let json = serde_json::to_value(value)
            .map_err(|e| RepositoryError::DataCorruption(format!("setting {key}: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO storefront.setting (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(json)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
