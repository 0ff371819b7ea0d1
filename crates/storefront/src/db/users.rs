//! Account persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use brana_core::{Email, UserId, UserRole};

use super::{PgStore, RepositoryError, map_unique_violation};
use crate::models::User;

/// Persistence for site accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by their ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user by their (normalized) email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Create a user with a password hash.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError>;

    /// Get a user together with their password hash.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Change a user's role. Returns `RepositoryError::NotFound` for unknown emails.
    async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError>;

    /// Number of accounts with the given role.
    async fn count_by_role(&self, role: UserRole) -> Result<u64, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(RepositoryError::DataCorruption)?;
        Ok(Self {
            id: UserId::new(row.id),
            email,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, role, created_at, updated_at";

#[async_trait]
impl UserStore for PgStore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.account WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.account WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.account (email, password_hash, role)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_unique_violation(e, "email"))?;
        User::try_from(row)
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM storefront.account WHERE email = $1"
        );
        let Some(row) = sqlx::query_as::<_, UserWithHashRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some((User::try_from(row.user)?, row.password_hash)))
    }

    async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.account SET role = $2, updated_at = now()
             WHERE email = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .bind(role.as_str())
            .fetch_optional(self.pool())
            .await?
            .ok_or(RepositoryError::NotFound)
            .and_then(User::try_from)
    }

    async fn count_by_role(&self, role: UserRole) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM storefront.account WHERE role = $1")
                .bind(role.as_str())
                .fetch_one(self.pool())
                .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
