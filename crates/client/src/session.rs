//! Session and identity.
//!
//! The server owns the session (an http-only cookie); the client only ever
//! learns who is logged in by asking `GET /api/auth/me`, cached under
//! [`keys::AUTH_ME`].

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::instrument;

use crate::cache::{QueryClient, QueryKey, keys};
use crate::error::ClientError;
use crate::models::{ProfileUpdate, Registration, User};
use crate::transport::{Transport, decode, fetch_get};

/// Login, registration, logout and password reset.
pub struct SessionProvider<'a, T> {
    cache: &'a QueryClient,
    transport: &'a Arc<T>,
}

impl<'a, T: Transport> SessionProvider<'a, T> {
    pub const fn new(cache: &'a QueryClient, transport: &'a Arc<T>) -> Self {
        Self { cache, transport }
    }

    /// The logged-in user, or `None`.
    ///
    /// Never fails: a 401, a network error and a server error all read as
    /// "not logged in".
    pub async fn current_user(&self) -> Option<User> {
        let key = QueryKey::new(keys::AUTH_ME);
        match self
            .cache
            .read_as::<User, _, _>(&key, || fetch_get(self.transport, &key))
            .await
        {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "No current user");
                None
            }
        }
    }

    /// Log in with an email address or phone number.
    ///
    /// # Errors
    ///
    /// [`ClientError::Authentication`] with the server's message when the
    /// credentials are wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, ClientError> {
        let body = json!({ "identifier": identifier, "password": password });
        let value = self
            .transport
            .request(Method::POST, "/api/auth/login", Some(body))
            .await?;
        let user: User = decode(&value)?;

        self.start_identity(value).await;
        tracing::info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Create an account. The server logs the new user in.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a duplicate email or phone or a
    /// missing field.
    #[instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, ClientError> {
        let body = serde_json::to_value(registration)?;
        let value = self
            .transport
            .request(Method::POST, "/api/auth/register", Some(body))
            .await?;
        let user: User = decode(&value)?;

        self.start_identity(value).await;
        tracing::info!(user_id = %user.id, "Registered");
        Ok(user)
    }

    /// Ask for a reset link. Succeeds whether or not the account exists.
    ///
    /// # Errors
    ///
    /// Only transport failures.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, identifier: &str) -> Result<(), ClientError> {
        self.transport
            .request(
                Method::POST,
                "/api/auth/forgot-password",
                Some(json!({ "identifier": identifier })),
            )
            .await?;
        Ok(())
    }

    /// Set a new password with a token from a reset link.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidToken`] if the token is missing, expired or
    /// already used; a missing token never reaches the server.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ClientError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::InvalidToken(
                "This reset link is incomplete. Request a new one.".to_owned(),
            ));
        }

        self.transport
            .request(
                Method::POST,
                "/api/auth/reset-password",
                Some(json!({ "token": token, "password": new_password })),
            )
            .await?;
        Ok(())
    }

    /// End the session.
    ///
    /// Identity-scoped entries are dropped before this returns, even when the
    /// server call fails, so the next identity never sees this one's data.
    ///
    /// # Errors
    ///
    /// The server or transport error, after the cache has been cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .transport
            .request(Method::POST, "/api/auth/logout", None)
            .await;

        self.forget_identity().await;
        result.map(|_| ())
    }

    /// Edit the logged-in user's profile.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session,
    /// [`ClientError::Validation`] for blank fields or a bad phone number.
    ///
    /// The cached cart is dropped, since its shipping depends on the address.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ClientError> {
        let body = serde_json::to_value(update)?;
        let value = self
            .transport
            .request(Method::PUT, "/api/auth/me", Some(body))
            .await?;
        let user: User = decode(&value)?;

        self.cache.write(&QueryKey::new(keys::AUTH_ME), value).await;
        // Shipping is priced against the profile address.
        self.cache.invalidate(&QueryKey::new(keys::CART)).await;
        Ok(user)
    }

    async fn start_identity(&self, user: Value) {
        self.forget_identity().await;
        self.cache.write(&QueryKey::new(keys::AUTH_ME), user).await;
    }

    async fn forget_identity(&self) {
        for path in keys::IDENTITY_SCOPED {
            self.cache.invalidate_prefix(path).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use loomline_core::Money;
    use serde_json::json;

    use super::*;
    use crate::cache::CachePolicy;
    use crate::testing::{FakeTransport, fixtures};

    fn setup() -> (QueryClient, Arc<FakeTransport>) {
        (QueryClient::default(), Arc::new(FakeTransport::new()))
    }

    #[tokio::test]
    async fn test_current_user_swallows_unauthorized() {
        let (cache, transport) = setup();
        transport.reply(Method::GET, "/api/auth/me", Err(ClientError::Unauthorized));

        let session = SessionProvider::new(&cache, &transport);
        assert!(session.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_current_user_swallows_network_errors() {
        let (cache, transport) = setup();
        transport.reply(
            Method::GET,
            "/api/auth/me",
            Err(ClientError::Network("connection refused".to_owned())),
        );

        let session = SessionProvider::new(&cache, &transport);
        assert!(session.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_login_writes_identity_without_refetch() {
        let (cache, transport) = setup();
        transport.reply(
            Method::POST,
            "/api/auth/login",
            Ok(fixtures::user(1, "asha@mehta.in", "customer")),
        );

        let session = SessionProvider::new(&cache, &transport);
        let user = session.login("asha@mehta.in", "correct horse").await.unwrap();
        assert_eq!(user.email.as_str(), "asha@mehta.in");

        let current = session.current_user().await.unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(transport.count(&Method::GET, "/api/auth/me"), 0);
    }

    #[tokio::test]
    async fn test_login_failure_carries_server_message() {
        let (cache, transport) = setup();
        transport.reply(
            Method::POST,
            "/api/auth/login",
            Err(ClientError::from_response(
                401,
                r#"{"message":"Invalid email/phone or password","code":"authentication"}"#,
            )),
        );

        let session = SessionProvider::new(&cache, &transport);
        let err = session.login("9876543210", "wrong").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Authentication("Invalid email/phone or password".to_owned())
        );
        assert!(cache.peek(&QueryKey::new(keys::AUTH_ME)).await.is_none());
    }

    #[tokio::test]
    async fn test_logout_drops_identity_scoped_entries() {
        let (cache, transport) = setup();
        transport.reply(Method::POST, "/api/auth/logout", Ok(Value::Null));
        cache
            .write(&QueryKey::new(keys::AUTH_ME), fixtures::user(1, "a@b.in", "customer"))
            .await;
        cache.write(&QueryKey::new(keys::CART), fixtures::cart(&[(1, 500, 2)])).await;
        cache.write(&QueryKey::new(keys::WATCHLIST), json!([])).await;
        cache.write(&QueryKey::new(keys::ORDERS), json!([])).await;
        cache
            .write(&keys::order(loomline_core::OrderId::new(5)), json!({}))
            .await;
        cache.write(&QueryKey::new("categories"), json!([])).await;

        SessionProvider::new(&cache, &transport).logout().await.unwrap();

        for path in keys::IDENTITY_SCOPED {
            assert!(cache.peek(&QueryKey::new(path)).await.is_none(), "{path} survived logout");
        }
        assert!(
            cache
                .peek(&keys::order(loomline_core::OrderId::new(5)))
                .await
                .is_none()
        );
        assert!(cache.peek(&QueryKey::new("categories")).await.is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_cache_even_when_server_fails() {
        let (cache, transport) = setup();
        transport.reply(
            Method::POST,
            "/api/auth/logout",
            Err(ClientError::Network("offline".to_owned())),
        );
        cache.write(&QueryKey::new(keys::CART), fixtures::cart(&[(1, 500, 2)])).await;

        let result = SessionProvider::new(&cache, &transport).logout().await;
        assert!(result.is_err());
        assert!(cache.peek(&QueryKey::new(keys::CART)).await.is_none());
    }

    #[tokio::test]
    async fn test_next_identity_never_sees_previous_cart() {
        let (cache, transport) = setup();
        transport
            .reply(Method::POST, "/api/auth/logout", Ok(Value::Null))
            .reply(
                Method::POST,
                "/api/auth/login",
                Ok(fixtures::user(2, "ravi@shah.in", "customer")),
            )
            .reply(Method::GET, "/api/cart", Ok(fixtures::cart(&[])));
        cache.write(&QueryKey::new(keys::CART), fixtures::cart(&[(1, 500, 2)])).await;

        let session = SessionProvider::new(&cache, &transport);
        session.logout().await.unwrap();
        session.login("ravi@shah.in", "another pass").await.unwrap();

        let cart = crate::cart::CartService::new(&cache, &transport).cart().await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_reset_with_missing_token_never_calls_server() {
        let (cache, transport) = setup();
        let session = SessionProvider::new(&cache, &transport);

        let err = session.reset_password("  ", "new password").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidToken(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_with_used_token() {
        let (cache, transport) = setup();
        transport.reply(
            Method::POST,
            "/api/auth/reset-password",
            Err(ClientError::from_response(
                400,
                r#"{"message":"This reset link is invalid or has expired","code":"invalid_token"}"#,
            )),
        );

        let err = SessionProvider::new(&cache, &transport)
            .reset_password("abc", "new password")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_identity() {
        let (cache, transport) = setup();
        let mut updated = fixtures::user(1, "asha@mehta.in", "customer");
        updated["address"] = json!("Ring Road, Surat");
        transport.reply(Method::PUT, "/api/auth/me", Ok(updated));

        let session = SessionProvider::new(&cache, &transport);
        let update = ProfileUpdate {
            address: Some("Ring Road, Surat".to_owned()),
            ..ProfileUpdate::default()
        };
        session.update_profile(&update).await.unwrap();

        let me = session.current_user().await.unwrap();
        assert_eq!(me.address, "Ring Road, Surat");
        assert_eq!(
            transport.body_of(&Method::PUT, "/api/auth/me"),
            Some(json!({"address": "Ring Road, Surat"}))
        );
    }

    #[tokio::test]
    async fn test_address_change_reprices_cart() {
        let cache = QueryClient::new(CachePolicy::new(
            Duration::from_secs(30),
            Duration::from_secs(300),
        ));
        let transport = Arc::new(FakeTransport::new());
        let mut surat_cart = fixtures::cart(&[(4, 500, 2)]);
        surat_cart["totals"]["shipping"] = json!("0.00");
        surat_cart["totals"]["total"] = json!("1180.00");
        let mut updated = fixtures::user(1, "asha@mehta.in", "customer");
        updated["address"] = json!("Ring Road, Surat");
        transport
            .reply(Method::GET, "/api/cart", Ok(fixtures::cart(&[(4, 500, 2)])))
            .reply(Method::GET, "/api/cart", Ok(surat_cart))
            .reply(Method::PUT, "/api/auth/me", Ok(updated));

        let carts = crate::cart::CartService::new(&cache, &transport);
        let before = carts.cart().await.unwrap();
        assert_eq!(before.totals.shipping, Money::from_major(100));

        let update = ProfileUpdate {
            address: Some("Ring Road, Surat".to_owned()),
            ..ProfileUpdate::default()
        };
        SessionProvider::new(&cache, &transport)
            .update_profile(&update)
            .await
            .unwrap();

        let after = carts.cart().await.unwrap();
        assert_eq!(transport.count(&Method::GET, "/api/cart"), 2);
        assert_eq!(after.totals.shipping, Money::ZERO);
    }
}
