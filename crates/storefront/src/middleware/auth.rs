//! Authentication middleware and extractors.
//!
//! Each extractor reads the session's [`CurrentUser`] and runs it through
//! [`Access::evaluate`] for its capability. A denial becomes a JSON 401 or
//! 403 before the handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use loomline_core::{Access, Capability};

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Look up the session's user, if any.
async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Resolve the caller and check `capability`.
async fn authorize(parts: &Parts, capability: Capability) -> Result<CurrentUser, AppError> {
    let user = session_user(parts).await;
    match Access::evaluate(user.as_ref().map(|u| u.role), capability) {
        Access::Allow => user.ok_or(AppError::Unauthorized("Please log in".to_owned())),
        Access::Deny(reason) => {
            tracing::debug!(?capability, ?reason, path = %parts.uri.path(), "Access denied");
            Err(reason.into())
        }
    }
}

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Capability::ManageAccount).await.map(Self)
    }
}

/// Extractor that requires a user allowed to keep a cart and place orders.
pub struct RequireCheckout(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireCheckout
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Capability::Checkout).await.map(Self)
    }
}

/// Extractor that requires back-office access.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Capability::ManageStore).await.map(Self)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// End the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use tower_sessions::MemoryStore;

    use loomline_core::{Email, Role, UserId};

    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            email: Email::parse("buyer@example.com").unwrap(),
            name: "Asha".to_owned(),
            role,
        }
    }

    async fn parts_with(user: Option<CurrentUser>) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(user) = user {
            session
                .insert(session_keys::CURRENT_USER, user)
                .await
                .unwrap();
        }
        let (mut parts, ()) = Request::builder()
            .uri("/api/admin/orders")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized() {
        let mut parts = parts_with(None).await;
        let err = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_customer_is_forbidden_from_admin() {
        let mut parts = parts_with(Some(user(Role::Customer))).await;
        let err = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);

        let RequireCheckout(u) = RequireCheckout::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(u.role, Role::Customer);
    }

    #[tokio::test]
    async fn test_admin_passes_admin_guard() {
        let mut parts = parts_with(Some(user(Role::Admin))).await;
        let RequireAdmin(u) = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(u.id, UserId::new(7));
    }

    #[tokio::test]
    async fn test_optional_auth_without_session_layer() {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let OptionalAuth(u) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(u.is_none());
    }
}
