//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomline_core::{Email, Phone, Role, UserId};

use crate::db::RepositoryError;

/// A storefront account (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub phone: Phone,
    pub name: String,
    pub business_name: String,
    /// Free-text delivery address.
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for `storefront.user`.
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub business_name: String,
    pub address: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email: {e}")))?;
        let phone = Phone::parse(&r.phone)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone: {e}")))?;
        let role = r.role.parse::<Role>().map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: r.id,
            email,
            phone,
            name: r.name,
            business_name: r.business_name,
            address: r.address,
            role,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated registration data.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub phone: Phone,
    pub name: String,
    pub business_name: String,
    pub address: String,
    pub role: Role,
}

/// Profile fields a user may change. `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}
