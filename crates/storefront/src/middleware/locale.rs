//! Response language negotiation.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::ACCEPT_LANGUAGE, request::Parts},
};

use brana_core::Locale;

use crate::state::AppState;

/// The language to answer in.
///
/// Resolution order: `?lang=` query parameter, then `Accept-Language`, then
/// the configured default. Unsupported values fall through to the next source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lang(pub Locale);

impl<S> FromRequestParts<S> for Lang
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let default = AppState::from_ref(state).config().default_locale;
        Ok(Self(resolve(parts, default)))
    }
}

fn resolve(parts: &Parts, default: Locale) -> Locale {
    let from_query = parts.uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "lang")
            .and_then(|(_, value)| value.parse::<Locale>().ok())
    });

    from_query
        .or_else(|| {
            parts
                .headers
                .get(ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(Locale::from_accept_language)
        })
        .unwrap_or(default)
}
