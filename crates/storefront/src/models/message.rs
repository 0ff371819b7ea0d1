//! Contact form messages and newsletter subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use brana_core::{Email, Locale, MessageId, SubscriberId};

/// A validated contact form submission, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub subject: Option<String>,
    pub message: String,
    pub locale: Locale,
}

/// A stored contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: MessageId,
    pub name: String,
    pub email: Email,
    pub subject: Option<String>,
    pub message: String,
    pub locale: Locale,
    pub created_at: DateTime<Utc>,
}

/// A newsletter subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: Email,
    pub locale: Locale,
    pub created_at: DateTime<Utc>,
}

/// Result of a subscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    AlreadySubscribed,
}
