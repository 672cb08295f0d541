//! Authentication routes: session identity, login, registration, password
//! reset and logout.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::user::ProfileUpdate;
use crate::models::{CurrentUser, User, session_keys};
use crate::services::auth::{AuthService, Registration};
use crate::services::email::reset_link;
use crate::state::AppState;

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Email address or phone number.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub identifier: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// The logged-in user.
///
/// GET /api/auth/me
#[instrument(skip(state, session, current))]
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    if let Some(user) = AuthService::new(state.pool()).get_user(current.id).await? {
        return Ok(Json(user));
    }

    // Account vanished under a live session.
    clear_current_user(&session).await?;
    Err(AppError::Unauthorized("Please log in".to_owned()))
}

/// Edit the logged-in user's profile.
///
/// PUT /api/auth/me
#[instrument(skip(state, session, current, update))]
pub async fn update_me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .update_profile(current.id, &update)
        .await?;

    // Keep the session's copy of the display name current.
    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&user))
        .await?;

    Ok(Json(user))
}

/// POST /api/auth/login
#[instrument(skip(state, session, form), fields(identifier = %form.identifier))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&form.identifier, &form.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    start_session(&session, &user).await?;
    add_breadcrumb("auth", "Logged in", None);
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(user))
}

/// Register and log in.
///
/// POST /api/auth/register
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<Registration>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool()).register(&form).await?;

    start_session(&session, &user).await?;
    add_breadcrumb("auth", "Registered", None);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Start a password reset.
///
/// POST /api/auth/forgot-password
///
/// Always answers 202 so the response doesn't reveal whether an account exists.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(form): Json<ForgotPasswordRequest>,
) -> Result<StatusCode> {
    let issued = AuthService::new(state.pool())
        .request_password_reset(&form.identifier)
        .await?;

    if let Some(issued) = issued {
        let link = reset_link(&state.config().base_url, &issued.token);
        match state.mailer() {
            Some(mailer) => {
                if let Err(e) = mailer
                    .send_password_reset(issued.user.email.as_str(), &issued.user.name, &link)
                    .await
                {
                    tracing::error!(user_id = %issued.user.id, error = %e, "Failed to send password reset email");
                }
            }
            None => {
                tracing::info!(user_id = %issued.user.id, reset_link = %link, "Password reset link (email disabled)");
            }
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// Finish a password reset.
///
/// POST /api/auth/reset-password
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .reset_password(&form.token, &form.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}
