//! Authentication route handlers.
//!
//! Accounts are local: argon2 password hashes in `storefront.account`, the
//! logged-in identity in the session.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{
    ApiJson, AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user,
};
use crate::i18n::Message;
use crate::middleware::{Lang, OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login and registration body.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser::from(user);
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// `POST /api/auth/register`
///
/// Creates a customer account and logs it in.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let auth = AuthService::new(state.stores().users.as_ref());
    let user = auth.register(&form.email, &form.password).await?;

    start_session(&session, &user).await?;
    add_breadcrumb("auth", "User registered", None);
    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<CredentialsRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.stores().users.as_ref());
    let user = match auth.login(&form.email, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            return Err(e.into());
        }
    };

    start_session(&session, &user).await?;
    add_breadcrumb("auth", "User logged in", None);

    Ok(Json(json!({ "user": user })))
}

/// `POST /api/auth/logout`
///
/// Succeeds whether or not anyone was logged in.
#[instrument(skip(session))]
pub async fn logout(session: Session, Lang(locale): Lang) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Json(json!({
        "success": true,
        "message": Message::LoggedOut.text(locale),
    })))
}

/// `GET /api/auth/me`
///
/// Reloads the account so a role change shows up without a new login.
#[instrument(skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let current =
        user.ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let auth = AuthService::new(state.stores().users.as_ref());
    let user = auth.get_user(current.id).await?;

    Ok(Json(json!({ "user": user })))
}
