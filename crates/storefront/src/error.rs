//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Errors are sent as `{"message": ..., "code": ...}` JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use loomline_core::DenyReason;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout or order management failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role lacks the capability.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: &'static str,
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// Status, machine code and client-facing message.
    ///
    /// Internal details are never included in the message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Database(err) => repository_parts(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "authentication",
                    "Invalid email/phone or password".to_owned(),
                ),
                AuthError::AlreadyRegistered(msg) => {
                    (StatusCode::CONFLICT, "conflict", msg.clone())
                }
                AuthError::InvalidIdentifier(e) => {
                    (StatusCode::BAD_REQUEST, "validation", e.to_string())
                }
                AuthError::InvalidEmail(e) => (
                    StatusCode::BAD_REQUEST,
                    "validation",
                    format!("Invalid email address: {e}"),
                ),
                AuthError::InvalidPhone(e) => (
                    StatusCode::BAD_REQUEST,
                    "validation",
                    format!("Invalid phone number: {e}"),
                ),
                AuthError::MissingField(_) => {
                    (StatusCode::BAD_REQUEST, "validation", err.to_string())
                }
                AuthError::WeakPassword(msg) => {
                    (StatusCode::BAD_REQUEST, "validation", capitalize(msg))
                }
                AuthError::InvalidToken => (
                    StatusCode::BAD_REQUEST,
                    "invalid_token",
                    "This reset link is invalid or has expired".to_owned(),
                ),
                AuthError::Repository(e) => repository_parts(e),
                AuthError::PasswordHash => internal(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "empty_cart",
                    "Your cart is empty".to_owned(),
                ),
                CheckoutError::InvalidTransition(e) => {
                    (StatusCode::CONFLICT, "conflict", capitalize(&e.to_string()))
                }
                CheckoutError::NotFound => {
                    (StatusCode::NOT_FOUND, "not_found", "Order not found".to_owned())
                }
                CheckoutError::Repository(e) => repository_parts(e),
            },
            Self::Session(_) | Self::Internal(_) => internal(),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please slow down.".to_owned(),
            ),
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal",
        INTERNAL_MESSAGE.to_owned(),
    )
}

fn repository_parts(err: &RepositoryError) -> (StatusCode, &'static str, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_owned()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
        RepositoryError::Invalid(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => Self::Unauthorized("Please log in".to_owned()),
            DenyReason::Forbidden => {
                Self::Forbidden("You don't have access to this page".to_owned())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(ErrorBody { message, code })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order placed", Some(&[("order_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
