//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account
//! BRANA_ADMIN_PASSWORD=... brana-cli admin create -e admin@brana.org
//!
//! # Promote an existing customer account
//! brana-cli admin promote -e staff@brana.org
//! ```

use thiserror::Error;

use brana_core::{Email, UserId, UserRole};
use brana_storefront::db::{PgStore, RepositoryError, UserStore};
use brana_storefront::services::auth::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors from admin commands.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Missing password: pass --password or set BRANA_ADMIN_PASSWORD")]
    MissingPassword,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No account with email: {0}")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns an error if the password is missing or weak, the email is taken,
/// or the database is unreachable.
pub async fn create_user(email: &str, password: Option<String>) -> Result<UserId, AdminError> {
    let password = password
        .or_else(|| std::env::var("BRANA_ADMIN_PASSWORD").ok())
        .filter(|p| !p.is_empty())
        .ok_or(AdminError::MissingPassword)?;

    let store = PgStore::new(connect().await?);
    tracing::info!("Creating admin account: {}", email);

    let user = AuthService::new(&store)
        .register_with_role(email, &password, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Give an existing account the admin role.
///
/// # Errors
///
/// Returns an error if the email is invalid or no such account exists.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let store = PgStore::new(connect().await?);
    let user = store
        .set_role(&email, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::NotFound(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("Account {} ({}) is now an admin", user.email, user.id);
    Ok(())
}
