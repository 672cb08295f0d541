//! Authentication error types.

use thiserror::Error;

use loomline_core::{IdentifierError, PhoneError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login identifier is neither a valid email nor a valid phone number.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    /// Invalid email format at registration.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] loomline_core::EmailError),

    /// Invalid phone format at registration or profile edit.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email or phone already registered; the message names which.
    #[error("{0}")]
    AlreadyRegistered(String),

    /// A required field is blank. Holds the field label.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Reset token unknown, expired or already used.
    #[error("invalid or expired reset token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
