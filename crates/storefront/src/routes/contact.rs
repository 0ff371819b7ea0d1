//! Contact form route handlers.
//!
//! Submissions are stored for the admin dashboard; nothing is emailed.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use brana_core::{Email, MessageId};

use crate::error::{ApiJson, AppError, Result};
use crate::i18n::Message;
use crate::middleware::Lang;
use crate::models::NewContactMessage;
use crate::state::AppState;

/// Longest accepted message body, in characters.
const MAX_MESSAGE_LENGTH: usize = 5000;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
    pub id: MessageId,
}

/// `POST /api/contact`
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    Lang(locale): Lang,
    ApiJson(form): ApiJson<ContactForm>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    let name = form.name.trim();
    let message = form.message.trim();
    if name.is_empty() || message.is_empty() {
        return Err(AppError::BadRequest(
            "Name and message are required".to_string(),
        ));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    let email = Email::parse(&form.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

    let saved = state
        .stores()
        .messages
        .save_contact(NewContactMessage {
            name: name.to_owned(),
            email,
            subject: form
                .subject
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            message: message.to_owned(),
            locale,
        })
        .await?;

    tracing::info!(message_id = %saved.id, "Contact message received");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            message: Message::ContactReceived.text(locale),
            id: saved.id,
        }),
    ))
}
