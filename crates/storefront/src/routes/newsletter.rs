//! Newsletter subscription route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use brana_core::Email;

use crate::error::{ApiJson, AppError, Result};
use crate::i18n::Message;
use crate::middleware::Lang;
use crate::models::SubscribeOutcome;
use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

/// `POST /api/newsletter`
///
/// Subscribing an address that is already on the list succeeds with a
/// different message.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn subscribe(
    State(state): State<AppState>,
    Lang(locale): Lang,
    ApiJson(form): ApiJson<SubscribeForm>,
) -> Result<Json<Value>> {
    let email = Email::parse(&form.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

    let outcome = state.stores().messages.subscribe(&email, locale).await?;
    let message = match outcome {
        SubscribeOutcome::Created => {
            tracing::info!("Newsletter subscriber added");
            Message::Subscribed
        }
        SubscribeOutcome::AlreadySubscribed => Message::AlreadySubscribed,
    };

    Ok(Json(json!({
        "success": true,
        "message": message.text(locale),
    })))
}
