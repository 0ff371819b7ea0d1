//! Catalog product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brana_core::{CartLineItem, Locale, LocalizedText, ProductId};

/// A catalog entry with bilingual copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_category() -> String {
    "general".to_string()
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// Snapshot this product into a cart line in the shopper's language.
    #[must_use]
    pub fn to_line_item(&self, quantity: u32, locale: Locale) -> CartLineItem {
        CartLineItem {
            product_id: self.id.clone(),
            name: self.name.get(locale).to_owned(),
            price: Some(self.price),
            image: self.image.clone(),
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_snapshot_uses_locale() {
        let product = Product {
            id: ProductId::from("p1"),
            name: LocalizedText::new("Psalter facsimile", "የዳዊት መዝሙር ቅጂ"),
            description: LocalizedText::default(),
            price: Decimal::new(450, 0),
            image: Some("/images/psalter.jpg".to_string()),
            category: "facsimiles".to_string(),
            stock: 3,
            active: true,
        };

        let line = product.to_line_item(2, Locale::Am);
        assert_eq!(line.name, "የዳዊት መዝሙር ቅጂ");
        assert_eq!(line.price, Some(Decimal::new(450, 0)));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.image.as_deref(), Some("/images/psalter.jpg"));
    }
}
