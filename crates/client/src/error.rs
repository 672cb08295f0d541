//! Client error taxonomy.
//!
//! Every failure a caller can see is a [`ClientError`]. Server failures are
//! classified from the `{message, code}` error body, falling back to the HTTP
//! status when the body is missing or unrecognised (e.g. a proxy error page).

use serde::Deserialize;
use thiserror::Error;

/// Shown when the server gave no usable message.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please wait a moment and try again.";

/// Errors returned by the client core.
///
/// `Clone` so that readers sharing one in-flight request all receive the
/// same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Wrong identifier or password.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server rejected the input (bad field, duplicate email or phone).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Password reset token missing, expired or already used.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Checkout attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// No session, or the session expired.
    #[error("not logged in")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: String,
}

impl ClientError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let ErrorBody { message, code } = serde_json::from_str(body).unwrap_or_default();

        match code.as_str() {
            "authentication" => Self::Authentication(message),
            "validation" | "conflict" => Self::Validation(message),
            "invalid_token" => Self::InvalidToken(message),
            "empty_cart" => Self::EmptyCart,
            "unauthorized" => Self::Unauthorized,
            "not_found" => Self::NotFound(message),
            _ => Self::from_status(status, message),
        }
    }

    fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound(message),
            400 | 409 | 422 => Self::Validation(message),
            429 if message.is_empty() => Self::Server {
                status,
                message: RATE_LIMITED_MESSAGE.to_owned(),
            },
            _ => Self::Server { status, message },
        }
    }

    /// The message to show the user.
    ///
    /// Server-supplied text wins; transport and decode failures get the
    /// generic fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Authentication(m)
            | Self::Validation(m)
            | Self::InvalidToken(m)
            | Self::NotFound(m)
            | Self::Server { message: m, .. } => Some(m.as_str()),
            Self::EmptyCart => Some("Your cart is empty"),
            Self::Unauthorized => Some("Please log in to continue"),
            Self::Network(_) | Self::Decode(_) => None,
        };

        message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map_or_else(|| GENERIC_MESSAGE.to_owned(), str::to_owned)
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
