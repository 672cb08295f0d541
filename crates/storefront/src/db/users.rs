//! User repository: accounts, password hashes and password reset tokens.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use loomline_core::{Identifier, Phone, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::user::{NewUser, ProfileUpdate, User, UserRow};

const USER_COLUMNS: &str = "u.id, u.email, u.phone, u.name, u.business_name, u.address, \
     u.role::text AS role, u.created_at, u.updated_at";

/// Message for a violated `storefront.user` unique constraint.
fn describe_user_conflict(constraint: Option<&str>) -> String {
    match constraint {
        Some("user_phone_key") => "An account with this phone number already exists".to_owned(),
        _ => "An account with this email already exists".to_owned(),
    }
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ResetTokenRow {
    id: i64,
    user_id: UserId,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.user u WHERE u.id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Get a user by email or phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_identifier(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .get_with_password(identifier)
            .await?
            .map(|(user, _)| user))
    }

    /// Get a user and their password hash by email or phone number.
    ///
    /// The hash is `None` for accounts without a password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let column = match identifier {
            Identifier::Email(_) => "email",
            Identifier::Phone(_) => "phone",
        };
        let sql = format!(
            "SELECT {USER_COLUMNS}, p.password_hash \
             FROM storefront.user u \
             LEFT JOIN storefront.user_password p ON p.user_id = u.id \
             WHERE u.{column} = $1"
        );

        let Some(row) = sqlx::query_as::<_, UserWithPasswordRow>(&sql)
            .bind(identifier.as_str())
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some((User::try_from(row.user)?, row.password_hash)))
    }

    /// Create a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO storefront.user AS u (email, phone, name, business_name, address, role) \
             VALUES ($1, $2, $3, $4, $5, $6::storefront.user_role) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.phone)
            .bind(&new_user.name)
            .bind(&new_user.business_name)
            .bind(&new_user.address)
            .bind(new_user.role.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, describe_user_conflict))?;

        let user = User::try_from(row)?;

        sqlx::query(
            r"
            INSERT INTO storefront.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Apply a profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new phone belongs to someone else.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        phone: Option<&Phone>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.user AS u SET \
                 name = COALESCE($2, u.name), \
                 business_name = COALESCE($3, u.business_name), \
                 address = COALESCE($4, u.address), \
                 phone = COALESCE($5, u.phone), \
                 updated_at = NOW() \
             WHERE u.id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.business_name.as_deref())
            .bind(update.address.as_deref())
            .bind(phone.map(Phone::as_str))
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_unique_violation(e, describe_user_conflict))?
            .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Create or promote an account to the given role, setting its password.
    ///
    /// Used by the CLI to seed administrators.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the phone belongs to a different account.
    pub async fn upsert_with_role(
        &self,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO storefront.user AS u (email, phone, name, business_name, address, role) \
             VALUES ($1, $2, $3, $4, $5, $6::storefront.user_role) \
             ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, updated_at = NOW() \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.phone)
            .bind(&new_user.name)
            .bind(&new_user.business_name)
            .bind(&new_user.address)
            .bind(new_user.role.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, describe_user_conflict))?;
        let user = User::try_from(row)?;

        set_password_hash(&mut tx, user.id, password_hash).await?;
        tx.commit().await?;

        Ok(user)
    }

    // =========================================================================
    // Password reset tokens
    // =========================================================================

    /// Store the hash of a freshly issued reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_reset_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.password_reset_token (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Redeem a reset token: set the new password and mark the token consumed,
    /// in one transaction.
    ///
    /// Returns `Ok(None)` when the token is unknown, expired or already used.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn redeem_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let token = sqlx::query_as::<_, ResetTokenRow>(
            r"
            SELECT id, user_id, expires_at, consumed_at
            FROM storefront.password_reset_token
            WHERE token_hash = $1
            FOR UPDATE
            ",
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(token) = token else {
            return Ok(None);
        };
        if token.consumed_at.is_some() || token.expires_at <= now {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE storefront.password_reset_token SET consumed_at = $2 WHERE id = $1",
        )
        .bind(token.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        set_password_hash(&mut tx, token.user_id, password_hash).await?;

        tx.commit().await?;

        Ok(Some(token.user_id))
    }
}

async fn set_password_hash(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: UserId,
    password_hash: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO storefront.user_password (user_id, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = NOW()
        ",
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_messages_name_the_field() {
        assert!(describe_user_conflict(Some("user_phone_key")).contains("phone"));
        assert!(describe_user_conflict(Some("user_email_key")).contains("email"));
        assert!(describe_user_conflict(None).contains("email"));
    }
}
