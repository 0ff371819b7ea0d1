//! User-facing response messages in English and Amharic.

use brana_core::Locale;

/// A localized response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    ItemAdded,
    CartUpdated,
    ItemRemoved,
    CartCleared,
    CartMerged,
    CartSynced,
    ContactReceived,
    Subscribed,
    AlreadySubscribed,
    LoggedOut,
}

impl Message {
    /// The message text in `locale`.
    #[must_use]
    pub const fn text(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::ItemAdded, Locale::En) => "Item added to cart",
            (Self::ItemAdded, Locale::Am) => "ዕቃው ወደ ጋሪ ተጨምሯል",
            (Self::CartUpdated, Locale::En) => "Cart updated",
            (Self::CartUpdated, Locale::Am) => "ጋሪው ተዘምኗል",
            (Self::ItemRemoved, Locale::En) => "Item removed from cart",
            (Self::ItemRemoved, Locale::Am) => "ዕቃው ከጋሪ ተወግዷል",
            (Self::CartCleared, Locale::En) => "Cart cleared",
            (Self::CartCleared, Locale::Am) => "ጋሪው ባዶ ሆኗል",
            (Self::CartMerged, Locale::En) => "Cart merged successfully",
            (Self::CartMerged, Locale::Am) => "ጋሪዎቹ ተዋህደዋል",
            (Self::CartSynced, Locale::En) => "Cart synced",
            (Self::CartSynced, Locale::Am) => "ጋሪው ተመሳስሏል",
            (Self::ContactReceived, Locale::En) => {
                "Thank you for your message. We will get back to you soon."
            }
            (Self::ContactReceived, Locale::Am) => "ስለመልእክትዎ እናመሰግናለን። በቅርቡ እንመልስልዎታለን።",
            (Self::Subscribed, Locale::En) => "Thank you for subscribing to our newsletter.",
            (Self::Subscribed, Locale::Am) => "ለጋዜጣችን ስለተመዘገቡ እናመሰግናለን።",
            (Self::AlreadySubscribed, Locale::En) => "This email is already subscribed.",
            (Self::AlreadySubscribed, Locale::Am) => "ይህ ኢሜይል አስቀድሞ ተመዝግቧል።",
            (Self::LoggedOut, Locale::En) => "You have been logged out.",
            (Self::LoggedOut, Locale::Am) => "ከመለያዎ ወጥተዋል።",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_message_has_both_languages() {
        let all = [
            Message::ItemAdded,
            Message::CartUpdated,
            Message::ItemRemoved,
            Message::CartCleared,
            Message::CartMerged,
            Message::CartSynced,
            Message::ContactReceived,
            Message::Subscribed,
            Message::AlreadySubscribed,
            Message::LoggedOut,
        ];
        for message in all {
            let en = message.text(Locale::En);
            let am = message.text(Locale::Am);
            assert!(!en.is_empty());
            assert!(!am.is_empty());
            assert_ne!(en, am, "{message:?} is untranslated");
        }
    }
}
