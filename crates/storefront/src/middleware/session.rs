//! Session middleware configuration.
//!
//! Sessions are stored in `PostgreSQL` (`tower_sessions.session`, created by
//! the initial migration) and identified by the `loomline_session` cookie.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "loomline_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How often expired sessions are purged.
const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60 * 60);

/// Create the session layer with `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Spawn a background task that deletes expired sessions every hour.
pub fn spawn_expired_session_cleanup(pool: &PgPool) -> JoinHandle<()> {
    let store = PostgresStore::new(pool.clone());
    tokio::spawn(async move {
        if let Err(e) = store
            .continuously_delete_expired(EXPIRED_SESSION_SWEEP)
            .await
        {
            tracing::error!(error = %e, "Expired session cleanup stopped");
        }
    })
}
