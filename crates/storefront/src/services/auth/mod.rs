//! Authentication service.
//!
//! Password login by email or phone, registration, profile edits and the
//! two-phase password reset.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::instrument;

use loomline_core::{Email, Identifier, Phone, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{NewUser, ProfileUpdate, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (argon2 input is bounded to keep hashing cheap).
const MAX_PASSWORD_LENGTH: usize = 128;

/// Reset links are valid for one hour.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Raw registration form.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub business_name: String,
    pub address: String,
    pub password: String,
}

/// A freshly issued reset token, to be delivered to the account's email.
pub struct IssuedResetToken {
    pub user: User,
    /// The raw token. Only its hash is stored.
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` for blank name, business name or address.
    /// Returns `AuthError::InvalidEmail` / `InvalidPhone` for malformed contacts.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::AlreadyRegistered` if the email or phone is taken.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        let new_user = validate_registration(form, Role::Customer)?;
        validate_password(&form.password)?;
        let password_hash = hash_password(&form.password)?;

        let user = self
            .users
            .create_with_password(&new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => AuthError::AlreadyRegistered(msg),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Customer registered");
        Ok(user)
    }

    /// Login with an email address or phone number and a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the account doesn't exist or
    /// the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = Identifier::parse(identifier).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Apply a profile edit.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if a provided field is blank.
    /// Returns `AuthError::AlreadyRegistered` if the new phone is taken.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        for (field, value) in [
            ("Name", &update.name),
            ("Business name", &update.business_name),
            ("Address", &update.address),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AuthError::MissingField(field));
            }
        }
        let trimmed = ProfileUpdate {
            name: update.name.as_deref().map(|s| s.trim().to_owned()),
            business_name: update.business_name.as_deref().map(|s| s.trim().to_owned()),
            address: update.address.as_deref().map(|s| s.trim().to_owned()),
            phone: None,
        };
        let phone = update.phone.as_deref().map(Phone::parse).transpose()?;

        self.users
            .update_profile(user_id, &trimmed, phone.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => AuthError::AlreadyRegistered(msg),
                other => AuthError::Repository(other),
            })
    }

    /// Current state of an account, for `GET /api/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_id(user_id).await?)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Issue a reset token for the account behind `identifier`.
    ///
    /// Returns `Ok(None)` for malformed or unknown identifiers so callers can
    /// answer identically either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database fails.
    #[instrument(skip(self))]
    pub async fn request_password_reset(
        &self,
        identifier: &str,
    ) -> Result<Option<IssuedResetToken>, AuthError> {
        let Ok(identifier) = Identifier::parse(identifier) else {
            return Ok(None);
        };
        let Some(user) = self.users.get_by_identifier(&identifier).await? else {
            tracing::debug!("Password reset requested for unknown account");
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.users
            .create_reset_token(user.id, &hash_token(&token), expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(Some(IssuedResetToken { user, token }))
    }

    /// Redeem a reset token and set a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::InvalidToken` if the token is unknown, expired or used.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        let user_id = self
            .users
            .redeem_reset_token(&hash_token(token), &password_hash, Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }

    /// Create or promote an administrator (CLI).
    ///
    /// # Errors
    ///
    /// Same validation errors as [`Self::register`].
    pub async fn upsert_admin(&self, form: &Registration) -> Result<User, AuthError> {
        let new_user = validate_registration(form, Role::Admin)?;
        validate_password(&form.password)?;
        let password_hash = hash_password(&form.password)?;

        self.users
            .upsert_with_role(&new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => AuthError::AlreadyRegistered(msg),
                other => AuthError::Repository(other),
            })
    }
}

/// Check required fields and parse contact details.
fn validate_registration(form: &Registration, role: Role) -> Result<NewUser, AuthError> {
    let email = Email::parse(&form.email)?;
    let phone = Phone::parse(&form.phone)?;

    let required = |field: &'static str, value: &str| {
        let value = value.trim();
        if value.is_empty() {
            Err(AuthError::MissingField(field))
        } else {
            Ok(value.to_owned())
        }
    };

    Ok(NewUser {
        email,
        phone,
        name: required("Name", &form.name)?,
        business_name: required("Business name", &form.business_name)?,
        address: required("Address", &form.address)?,
        role,
    })
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// 32 random bytes, base64url without padding.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a reset token, as stored in the database.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> Registration {
        Registration {
            email: " Buyer@Textiles.in ".to_owned(),
            phone: "+91 98765-43210".to_owned(),
            name: " Asha Patel ".to_owned(),
            business_name: "Patel Fabrics".to_owned(),
            address: "Ring Road, Surat".to_owned(),
            password: "correct horse".to_owned(),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("s3cure-passw0rd").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cure-passw0rd", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eightchr").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_registration_normalizes_fields() {
        let user = validate_registration(&form(), Role::Customer).unwrap();
        assert_eq!(user.email.as_str(), "buyer@textiles.in");
        assert_eq!(user.phone.as_str(), "+919876543210");
        assert_eq!(user.name, "Asha Patel");
        assert_eq!(user.role, Role::Customer);
    }

    #[test]
    fn test_registration_requires_business_name() {
        let mut f = form();
        f.business_name = "   ".to_owned();
        assert!(matches!(
            validate_registration(&f, Role::Customer),
            Err(AuthError::MissingField("Business name"))
        ));
    }

    #[test]
    fn test_registration_rejects_bad_contacts() {
        let mut f = form();
        f.email = "not-an-email".to_owned();
        assert!(matches!(
            validate_registration(&f, Role::Customer),
            Err(AuthError::InvalidEmail(_))
        ));

        let mut f = form();
        f.phone = "12345".to_owned();
        assert!(matches!(
            validate_registration(&f, Role::Customer),
            Err(AuthError::InvalidPhone(_))
        ));
    }

    #[test]
    fn test_reset_tokens_are_random_and_url_safe() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_token_hash_is_sha256_hex() {
        let h = hash_token("abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
