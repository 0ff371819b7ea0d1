//! Site languages and bilingual text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A language the site is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    /// Amharic.
    Am,
}

impl Locale {
    /// BCP 47 language tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Am => "am",
        }
    }

    /// Pick the best supported locale from an `Accept-Language` header value.
    ///
    /// Entries are considered in descending `q` order; the first one whose
    /// primary subtag is supported wins.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut candidates: Vec<(f32, Self)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.trim().split(';');
                let tag = parts.next()?.trim();
                let q = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let primary = tag.split('-').next()?;
                primary.parse::<Self>().ok().map(|locale| (q, locale))
            })
            .collect();

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.first().map(|(_, locale)| *locale)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "am" => Ok(Self::Am),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Text published in English with an optional Amharic translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub am: Option<String>,
}

impl LocalizedText {
    /// Create text with both languages.
    #[must_use]
    pub fn new(en: impl Into<String>, am: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            am: Some(am.into()),
        }
    }

    /// Text for `locale`, falling back to English when no translation exists.
    #[must_use]
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Am => self
                .am
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(&self.en),
            Locale::En => &self.en,
        }
    }
}
