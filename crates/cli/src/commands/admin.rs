//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! LOOMLINE_ADMIN_PASSWORD=... loomline-cli admin create \
//!     -e owner@loomline.in -p 9876543210 -n "Owner"
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `LOOMLINE_ADMIN_PASSWORD` - Password for the admin account (kept out of
//!   shell history and process listings)

use thiserror::Error;

use loomline_storefront::services::AuthService;
use loomline_storefront::services::auth::{AuthError, Registration};

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Account details from the command line.
pub struct NewAdmin {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub business_name: String,
    pub address: String,
}

/// Create an admin user, or promote and re-key the account that already
/// uses this email.
///
/// # Returns
///
/// The ID of the admin user.
pub async fn create_user(admin: NewAdmin) -> Result<i64, AdminError> {
    dotenvy::dotenv().ok();

    let password = std::env::var("LOOMLINE_ADMIN_PASSWORD")
        .map_err(|_| CommandError::MissingEnvVar("LOOMLINE_ADMIN_PASSWORD"))?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", admin.email);

    let registration = Registration {
        email: admin.email,
        phone: admin.phone,
        name: admin.name,
        business_name: admin.business_name,
        address: admin.address,
        password,
    };
    let user = AuthService::new(&pool).upsert_admin(&registration).await?;

    tracing::info!(
        "Admin user ready! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id.as_i64())
}
