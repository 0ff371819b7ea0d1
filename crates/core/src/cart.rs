//! Cart line items and the cart algebra shared by server and client.
//!
//! A [`Cart`] is an ordered list of [`CartLineItem`]s, unique by product id.
//! Every mutation a front-end can request is expressed as a [`CartCommand`];
//! [`Cart::apply`] performs it and hands back the command that undoes it, which
//! is how the client rolls back an optimistic update when persistence fails.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Largest quantity one line can hold, the top of a PostgreSQL `INTEGER`.
pub const MAX_LINE_QUANTITY: u32 = 2_147_483_647;

/// Clamp a requested quantity into `0..=MAX_LINE_QUANTITY`.
#[must_use]
pub fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.clamp(0, i64::from(MAX_LINE_QUANTITY))).unwrap_or(MAX_LINE_QUANTITY)
}

/// One product/quantity entry in a cart.
///
/// `name`, `price` and `image` are a snapshot taken when the item was first
/// added and are never refreshed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    /// Unit price. Absent for items written by older clients; totals count it as zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLineItem {
    /// Create a line item with a price snapshot.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Option<Decimal>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            image: None,
            quantity,
        }
    }

    /// Set the image snapshot.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Unit price times quantity (zero when the price is unknown).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity)
    }
}

/// A cart mutation.
///
/// `Add`, `SetQuantity`, `Remove` and `Clear` are what users ask for.
/// `Restore` and `Replace` exist so that every command has an exact inverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CartCommand {
    /// Increment an existing line by `item.quantity`, or append `item`.
    Add { item: CartLineItem },
    /// Set a line's quantity; zero or less removes the line.
    SetQuantity { product_id: ProductId, quantity: i64 },
    /// Delete the line for a product.
    Remove { product_id: ProductId },
    /// Delete every line.
    Clear,
    /// Put a line back at a position (overwriting a line for the same product).
    Restore { item: CartLineItem, index: usize },
    /// Overwrite the whole cart.
    Replace { items: Vec<CartLineItem> },
}

impl CartCommand {
    /// The product this command targets, if it targets exactly one.
    #[must_use]
    pub const fn product_id(&self) -> Option<&ProductId> {
        match self {
            Self::Add { item } | Self::Restore { item, .. } => Some(&item.product_id),
            Self::SetQuantity { product_id, .. } | Self::Remove { product_id } => Some(product_id),
            Self::Clear | Self::Replace { .. } => None,
        }
    }
}

/// An ordered collection of line items, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from arbitrary items.
    ///
    /// Duplicate product ids are folded into the first occurrence (quantities
    /// summed, first display snapshot kept) and zero-quantity lines dropped.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut cart = Self::new();
        cart.merge(items);
        cart
    }

    /// The line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Consume the cart and return its line items.
    #[must_use]
    pub fn into_items(self) -> Vec<CartLineItem> {
        self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities (the header badge number).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| &item.product_id == product_id)
    }

    /// Add an item: increment the existing line or append a new one.
    ///
    /// A zero quantity is ignored.
    pub fn add(&mut self, item: CartLineItem) {
        self.apply(CartCommand::Add { item });
    }

    /// Set a line's quantity; zero or negative removes the line.
    ///
    /// Unknown product ids are ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        self.apply(CartCommand::SetQuantity {
            product_id: product_id.clone(),
            quantity,
        });
    }

    /// Remove every line for a product. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        self.items.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Fold incoming items into this cart.
    ///
    /// Each incoming item increments the matching line's quantity. Display
    /// fields are only taken from an incoming item when it creates the line.
    pub fn merge(&mut self, items: impl IntoIterator<Item = CartLineItem>) {
        for item in items {
            self.add(item);
        }
    }

    /// Overwrite the cart, normalizing duplicates and empty lines.
    pub fn replace(&mut self, items: impl IntoIterator<Item = CartLineItem>) {
        *self = Self::from_items(items);
    }

    /// Apply a command and return the command that undoes it.
    ///
    /// Returns `None` when the command left the cart unchanged.
    pub fn apply(&mut self, command: CartCommand) -> Option<CartCommand> {
        match command {
            CartCommand::Add { item } => self.apply_add(item),
            CartCommand::SetQuantity {
                product_id,
                quantity,
            } => self.apply_set_quantity(&product_id, quantity),
            CartCommand::Remove { product_id } => {
                let index = self.position(&product_id)?;
                let item = self.items.remove(index);
                // Uniqueness holds for carts built through this API; sweep anyway.
                self.items.retain(|other| other.product_id != product_id);
                Some(CartCommand::Restore { item, index })
            }
            CartCommand::Clear => {
                if self.items.is_empty() {
                    return None;
                }
                let items = std::mem::take(&mut self.items);
                Some(CartCommand::Replace { items })
            }
            CartCommand::Restore { item, index } => self.apply_restore(item, index),
            CartCommand::Replace { items } => {
                let replacement = Self::from_items(items);
                if replacement == *self {
                    return None;
                }
                let previous = std::mem::replace(self, replacement);
                Some(CartCommand::Replace {
                    items: previous.items,
                })
            }
        }
    }

    fn apply_add(&mut self, mut item: CartLineItem) -> Option<CartCommand> {
        if item.quantity == 0 {
            return None;
        }
        item.quantity = item.quantity.min(MAX_LINE_QUANTITY);
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            let previous = line.quantity;
            line.quantity = previous.saturating_add(item.quantity).min(MAX_LINE_QUANTITY);
            return Some(CartCommand::SetQuantity {
                product_id: item.product_id,
                quantity: i64::from(previous),
            });
        }
        let product_id = item.product_id.clone();
        self.items.push(item);
        Some(CartCommand::Remove { product_id })
    }

    fn apply_set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Option<CartCommand> {
        let index = self.position(product_id)?;
        if quantity <= 0 {
            let item = self.items.remove(index);
            return Some(CartCommand::Restore { item, index });
        }
        let quantity = clamp_quantity(quantity);
        let line = self.items.get_mut(index)?;
        if line.quantity == quantity {
            return None;
        }
        let previous = std::mem::replace(&mut line.quantity, quantity);
        Some(CartCommand::SetQuantity {
            product_id: product_id.clone(),
            quantity: i64::from(previous),
        })
    }

    fn apply_restore(&mut self, item: CartLineItem, index: usize) -> Option<CartCommand> {
        if let Some(existing) = self.position(&item.product_id) {
            let slot = self.items.get_mut(existing)?;
            if *slot == item {
                return None;
            }
            let previous = std::mem::replace(slot, item);
            return Some(CartCommand::Restore {
                item: previous,
                index: existing,
            });
        }
        if item.quantity == 0 {
            return None;
        }
        let product_id = item.product_id.clone();
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        Some(CartCommand::Remove { product_id })
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl FromIterator<CartLineItem> for Cart {
    fn from_iter<T: IntoIterator<Item = CartLineItem>>(iter: T) -> Self {
        Self::from_items(iter)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(id: &str, quantity: u32) -> CartLineItem {
        CartLineItem::new(id, format!("Item {id}"), Some(Decimal::new(450, 0)), quantity)
    }

    fn pid(id: &str) -> ProductId {
        ProductId::from(id)
    }

    fn quantities(cart: &Cart) -> Vec<(&str, u32)> {
        cart.items()
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity))
            .collect()
    }

    #[test]
    fn test_add_same_product_accumulates() {
        let mut cart = Cart::new();
        cart.add(item("p1", 2));
        cart.add(item("p1", 3));
        assert_eq!(quantities(&cart), vec![("p1", 5)]);
    }

    #[test]
    fn test_quantities_capped_at_line_limit() {
        let mut cart = Cart::new();
        cart.add(item("p1", u32::MAX));
        cart.add(item("p2", MAX_LINE_QUANTITY));
        cart.add(item("p2", 5));
        cart.add(item("p3", 1));
        cart.update_quantity(&pid("p3"), i64::MAX);

        assert_eq!(
            quantities(&cart),
            vec![
                ("p1", MAX_LINE_QUANTITY),
                ("p2", MAX_LINE_QUANTITY),
                ("p3", MAX_LINE_QUANTITY)
            ]
        );
        assert_eq!(clamp_quantity(-4), 0);
        assert_eq!(clamp_quantity(12), 12);
    }

    #[test]
    fn test_add_keeps_first_snapshot() {
        let mut cart = Cart::new();
        cart.add(item("p1", 1));
        let mut repriced = item("p1", 1);
        repriced.price = Some(Decimal::new(999, 0));
        repriced.name = "Renamed".to_string();
        cart.add(repriced);

        let line = cart.get(&pid("p1")).unwrap();
        assert_eq!(line.price, Some(Decimal::new(450, 0)));
        assert_eq!(line.name, "Item p1");
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let mut cart = Cart::new();
        cart.add(item("p1", 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_to_zero_or_negative_removes() {
        let mut cart = Cart::from_items([item("a", 2), item("b", 1)]);
        cart.update_quantity(&pid("a"), 0);
        assert_eq!(quantities(&cart), vec![("b", 1)]);

        cart.update_quantity(&pid("b"), -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_sets_quantity() {
        let mut cart = Cart::from_items([item("a", 2)]);
        cart.update_quantity(&pid("a"), 7);
        assert_eq!(quantities(&cart), vec![("a", 7)]);
    }

    #[test]
    fn test_update_unknown_product_is_noop() {
        let mut cart = Cart::from_items([item("a", 2)]);
        cart.update_quantity(&pid("zzz"), 3);
        assert_eq!(quantities(&cart), vec![("a", 2)]);
    }

    #[test]
    fn test_remove_absent_product_is_noop() {
        let mut cart = Cart::from_items([item("a", 2)]);
        assert!(!cart.remove(&pid("missing")));
        assert_eq!(quantities(&cart), vec![("a", 2)]);
    }

    #[test]
    fn test_clear_empties_any_cart() {
        let mut cart = Cart::from_items([item("a", 2), item("b", 9)]);
        cart.clear();
        assert!(cart.is_empty());

        let mut empty = Cart::new();
        empty.clear();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_merge_guest_into_remote() {
        let mut remote = Cart::from_items([item("A", 1)]);
        remote.merge([item("A", 2), item("B", 1)]);
        assert_eq!(quantities(&remote), vec![("A", 3), ("B", 1)]);
    }

    #[test]
    fn test_merge_empty_is_noop() {
        let mut remote = Cart::from_items([item("A", 1)]);
        remote.merge(Vec::new());
        assert_eq!(quantities(&remote), vec![("A", 1)]);
    }

    #[test]
    fn test_merge_accepts_missing_price() {
        let mut cart = Cart::new();
        cart.merge([CartLineItem::new("p9", "Unpriced", None, 2)]);
        assert_eq!(cart.subtotal(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_from_items_folds_duplicates() {
        let cart = Cart::from_items([item("a", 1), item("b", 2), item("a", 4), item("c", 0)]);
        assert_eq!(quantities(&cart), vec![("a", 5), ("b", 2)]);
    }

    #[test]
    fn test_subtotal_and_count() {
        let cart = Cart::from_items([item("a", 2), item("b", 1)]);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Decimal::new(1350, 0));
    }

    fn assert_inverse_restores(start: &Cart, command: CartCommand) {
        let mut cart = start.clone();
        let inverse = cart.apply(command.clone());
        match inverse {
            Some(inverse) => {
                cart.apply(inverse);
                assert_eq!(&cart, start, "inverse of {command:?} did not restore");
            }
            None => assert_eq!(&cart, start, "{command:?} reported no change but mutated"),
        }
    }

    #[test]
    fn test_every_command_has_exact_inverse() {
        let start = Cart::from_items([item("a", 2), item("b", 1), item("c", 5)]);
        let commands = vec![
            CartCommand::Add { item: item("a", 3) },
            CartCommand::Add { item: item("new", 1) },
            CartCommand::SetQuantity { product_id: pid("b"), quantity: 4 },
            CartCommand::SetQuantity { product_id: pid("b"), quantity: 0 },
            CartCommand::SetQuantity { product_id: pid("c"), quantity: -1 },
            CartCommand::SetQuantity { product_id: pid("none"), quantity: 2 },
            CartCommand::Remove { product_id: pid("b") },
            CartCommand::Remove { product_id: pid("none") },
            CartCommand::Clear,
            CartCommand::Replace { items: vec![item("z", 1)] },
            CartCommand::Restore { item: item("b", 8), index: 0 },
            CartCommand::Restore { item: item("q", 1), index: 99 },
        ];
        for command in commands {
            assert_inverse_restores(&start, command);
        }
    }

    #[test]
    fn test_remove_inverse_restores_position() {
        let mut cart = Cart::from_items([item("a", 1), item("b", 1), item("c", 1)]);
        let inverse = cart.apply(CartCommand::Remove { product_id: pid("b") }).unwrap();
        assert_eq!(quantities(&cart), vec![("a", 1), ("c", 1)]);
        cart.apply(inverse);
        assert_eq!(quantities(&cart), vec![("a", 1), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn test_serializes_as_bare_array() {
        let cart = Cart::from_items([CartLineItem::new("p1", "Psalter", Some(Decimal::new(450, 0)), 1)]);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json[0]["productId"], "p1");
        assert_eq!(json[0]["quantity"], 1);

        let parsed: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, cart);
    }

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_value(CartCommand::Remove { product_id: pid("p1") }).unwrap();
        assert_eq!(json["op"], "remove");
        assert_eq!(json["product_id"], "p1");
    }
}
