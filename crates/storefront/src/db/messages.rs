//! Contact messages and newsletter subscribers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use brana_core::{Email, Locale, MessageId, SubscriberId};

use super::{PgStore, RepositoryError};
use crate::models::{ContactMessage, NewContactMessage, SubscribeOutcome, Subscriber};

/// Persistence for inbound messages from the public site.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a contact form submission.
    async fn save_contact(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessage, RepositoryError>;

    /// Most recent contact messages.
    async fn list_contacts(&self, limit: u32) -> Result<Vec<ContactMessage>, RepositoryError>;

    /// Subscribe an email. Subscribing twice is not an error.
    async fn subscribe(
        &self,
        email: &Email,
        locale: Locale,
    ) -> Result<SubscribeOutcome, RepositoryError>;

    /// Most recent subscribers.
    async fn list_subscribers(&self, limit: u32) -> Result<Vec<Subscriber>, RepositoryError>;

    /// Total contact messages and subscribers.
    async fn counts(&self) -> Result<(u64, u64), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i32,
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
    locale: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for ContactMessage {
    type Error = RepositoryError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(row.id),
            name: row.name,
            email: parse_email(&row.email)?,
            subject: row.subject,
            message: row.message,
            locale: row.locale.parse().unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i32,
    email: String,
    locale: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SubscriberId::new(row.id),
            email: parse_email(&row.email)?,
            locale: row.locale.parse().unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

#[async_trait]
impl MessageStore for PgStore {
    async fn save_contact(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(
            r"
            INSERT INTO storefront.contact_message (name, email, subject, message, locale)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, subject, message, locale, created_at
            ",
        )
        .bind(&message.name)
        .bind(message.email.as_str())
        .bind(message.subject.as_deref())
        .bind(&message.message)
        .bind(message.locale.as_str())
        .fetch_one(self.pool())
        .await?;
        ContactMessage::try_from(row)
    }

    async fn list_contacts(&self, limit: u32) -> Result<Vec<ContactMessage>, RepositoryError> {
        sqlx::query_as::<_, ContactRow>(
            r"
            SELECT id, name, email, subject, message, locale, created_at
            FROM storefront.contact_message
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(ContactMessage::try_from)
        .collect()
    }

    async fn subscribe(
        &self,
        email: &Email,
        locale: Locale,
    ) -> Result<SubscribeOutcome, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.newsletter_subscriber (email, locale)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            ",
        )
        .bind(email.as_str())
        .bind(locale.as_str())
        .execute(self.pool())
        .await?;

        Ok(if result.rows_affected() == 0 {
            SubscribeOutcome::AlreadySubscribed
        } else {
            SubscribeOutcome::Created
        })
    }

    async fn list_subscribers(&self, limit: u32) -> Result<Vec<Subscriber>, RepositoryError> {
        sqlx::query_as::<_, SubscriberRow>(
            r"
            SELECT id, email, locale, created_at
            FROM storefront.newsletter_subscriber
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(Subscriber::try_from)
        .collect()
    }

    async fn counts(&self) -> Result<(u64, u64), RepositoryError> {
        let (messages, subscribers): (i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM storefront.contact_message),
                (SELECT COUNT(*) FROM storefront.newsletter_subscriber)
            ",
        )
        .fetch_one(self.pool())
        .await?;
        Ok((
            u64::try_from(messages).unwrap_or(0),
            u64::try_from(subscribers).unwrap_or(0),
        ))
    }
}
