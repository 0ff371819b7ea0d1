//! Server-side cart operations.
//!
//! Every mutation goes through [`CartService`], which persists it and then
//! publishes a [`CartEvent`] on the application bus. Events are only
//! published after the store accepted the write.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use brana_core::{Bus, Cart, CartLineItem, Locale, ProductId, UserId};

use crate::db::{CartStore, RepositoryError};
use crate::services::catalog::Catalog;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity missing, zero or negative where a positive one is required.
    #[error("quantity must be a positive integer")]
    InvalidQuantity,

    /// No active catalog entry with this id.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What happened to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEventKind {
    Added,
    Updated,
    Removed,
    Cleared,
    Merged,
    Synced,
}

/// Published after every successful cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEvent {
    pub owner: UserId,
    pub kind: CartEventKind,
    pub item_count: u32,
}

/// Cart operations for one request.
pub struct CartService<'a> {
    carts: &'a dyn CartStore,
    catalog: &'a Catalog,
    events: &'a Bus<CartEvent>,
}

impl<'a> CartService<'a> {
    /// Create a cart service over the given store, catalog and bus.
    #[must_use]
    pub const fn new(
        carts: &'a dyn CartStore,
        catalog: &'a Catalog,
        events: &'a Bus<CartEvent>,
    ) -> Self {
        Self {
            carts,
            catalog,
            events,
        }
    }

    fn publish(&self, owner: UserId, kind: CartEventKind, cart: &Cart) {
        let delivered = self.events.publish(CartEvent {
            owner,
            kind,
            item_count: cart.item_count(),
        });
        tracing::debug!(owner = %owner, ?kind, delivered, "Published cart event");
    }

    /// The owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn get(&self, owner: UserId) -> Result<Cart, CartError> {
        Ok(self.carts.load(owner).await?)
    }

    /// Add a catalog product. The line snapshot (name, price, image) is taken
    /// from the catalog in the shopper's language.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities below 1 and
    /// `CartError::UnknownProduct` for missing or inactive products.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        owner: UserId,
        product_id: &ProductId,
        quantity: i64,
        locale: Locale,
    ) -> Result<Cart, CartError> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(CartError::InvalidQuantity)?;

        let product = self
            .catalog
            .product(product_id)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| CartError::UnknownProduct(product_id.clone()))?;

        let cart = self
            .carts
            .add_item(owner, product.to_line_item(quantity, locale))
            .await?;
        self.publish(owner, CartEventKind::Added, &cart);
        Ok(cart)
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        owner: UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let cart = self.carts.set_quantity(owner, product_id, quantity).await?;
        self.publish(owner, CartEventKind::Updated, &cart);
        Ok(cart)
    }

    /// Remove a line. Absent products leave the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, owner: UserId, product_id: &ProductId) -> Result<Cart, CartError> {
        let cart = self.carts.remove_item(owner, product_id).await?;
        self.publish(owner, CartEventKind::Removed, &cart);
        Ok(cart)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, owner: UserId) -> Result<(), CartError> {
        self.carts.clear(owner).await?;
        self.publish(owner, CartEventKind::Cleared, &Cart::new());
        Ok(())
    }

    /// Fold a guest cart into the owner's cart.
    ///
    /// Items are not checked against the catalog; their snapshots are kept
    /// as sent. An empty list changes nothing and publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self, items), fields(incoming = items.len()))]
    pub async fn merge(&self, owner: UserId, items: Vec<CartLineItem>) -> Result<Cart, CartError> {
        if items.iter().all(|item| item.quantity == 0) {
            return self.get(owner).await;
        }
        let cart = self.carts.merge(owner, items).await?;
        self.publish(owner, CartEventKind::Merged, &cart);
        Ok(cart)
    }

    /// Overwrite the owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self, items), fields(incoming = items.len()))]
    pub async fn sync(&self, owner: UserId, items: Vec<CartLineItem>) -> Result<Cart, CartError> {
        let cart = self.carts.replace(owner, items).await?;
        self.publish(owner, CartEventKind::Synced, &cart);
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use brana_core::LocalizedText;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::{MemoryStore, ProductStore};
    use crate::models::Product;

    const OWNER: UserId = UserId::new(7);

    async fn fixture() -> (Arc<MemoryStore>, Catalog, Bus<CartEvent>) {
        let store = Arc::new(MemoryStore::new());
        for (id, price, active) in [("p1", 450, true), ("p2", 120, true), ("p3", 90, false)] {
            store
                .upsert(&Product {
                    id: ProductId::from(id),
                    name: LocalizedText::new(format!("Item {id}"), format!("ዕቃ {id}")),
                    description: LocalizedText::default(),
                    price: Decimal::new(price, 0),
                    image: None,
                    category: "facsimiles".to_string(),
                    stock: 5,
                    active,
                })
                .await
                .unwrap();
        }
        let catalog = Catalog::new(store.clone());
        (store, catalog, Bus::new(16))
    }

    fn pid(id: &str) -> ProductId {
        ProductId::from(id)
    }

    #[tokio::test]
    async fn test_add_same_product_twice_sums_quantities() {
        let (store, catalog, bus) = fixture().await;
        let carts = CartService::new(store.as_ref(), &catalog, &bus);

        carts.add(OWNER, &pid("p1"), 2, Locale::En).await.unwrap();
        let cart = carts.add(OWNER, &pid("p1"), 3, Locale::En).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.items()[0].price, Some(Decimal::new(450, 0)));
    }

    #[tokio::test]
    async fn test_add_snapshots_localized_name() {
        let (store, catalog, bus) = fixture().await;
        let carts = CartService::new(store.as_ref(), &catalog, &bus);

        let cart = carts.add(OWNER, &pid("p2"), 1, Locale::Am).await.unwrap();
        assert_eq!(cart.items()[0].name, "ዕቃ p2");
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let (store, catalog, bus) = fixture().await;
        let carts = CartService::new(store.as_ref(), &catalog, &bus);

        assert!(matches!(
            carts.add(OWNER, &pid("p1"), 0, Locale::En).await,
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            carts.add(OWNER, &pid("p1"), -2, Locale::En).await,
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            carts.add(OWNER, &pid("missing"), 1, Locale::En).await,
            Err(CartError::UnknownProduct(_))
        ));
        assert!(matches!(
            carts.add(OWNER, &pid("p3"), 1, Locale::En).await,
            Err(CartError::UnknownProduct(_))
        ));
        assert!(carts.get(OWNER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_to_zero_or_negative_removes() {
        let (store, catalog, bus) = fixture().await;
        let carts = CartService::new(store.as_ref(), &catalog, &bus);
        carts.add(OWNER, &pid("p1"), 1, Locale::En).await.unwrap();
        carts.add(OWNER, &pid("p2"), 1, Locale::En).await.unwrap();

        let cart = carts.update(OWNER, &pid("p1"), 0).await.unwrap();
        assert!(cart.get(&pid("p1")).is_none());
        let cart = carts.update(OWNER, &pid("p2"), -4).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_noop() {
        let (store, catalog, bus) = fixture().await;
        let carts = CartService::new(store.as_ref(), &catalog, &bus);
        let before = carts.add(OWNER, &pid("p1"), 1, Locale::En).await.unwrap();

        let after = carts.remove(OWNER, &pid("nope")).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_merge_into_existing_cart() {
        let (store, catalog, bus) = fixture().await;
        let carts = CartService::new(store.as_ref(), &catalog, &bus);
        carts.add(OWNER, &pid("p1"), 1, Locale::En).await.unwrap();

        let cart = carts
            .merge(
                OWNER,
                vec![
                    CartLineItem::new("p1", "Item p1", Some(Decimal::new(450, 0)), 2),
                    CartLineItem::new("p2", "Item p2", Some(Decimal::new(120, 0)), 1),
                ],
            )
            .await
            .unwrap();

        assert_eq!(cart.get(&pid("p1")).unwrap().quantity, 3);
        assert_eq!(cart.get(&pid("p2")).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_events_published_after_mutations() {
        let (store, catalog, bus) = fixture().await;
        let mut subscription = bus.subscribe();
        let carts = CartService::new(store.as_ref(), &catalog, &bus);

        carts.add(OWNER, &pid("p1"), 2, Locale::En).await.unwrap();
        carts.clear(OWNER).await.unwrap();
        carts.merge(OWNER, Vec::new()).await.unwrap();

        let added = subscription.try_recv().unwrap();
        assert_eq!(added.kind, CartEventKind::Added);
        assert_eq!(added.item_count, 2);
        assert_eq!(added.owner, OWNER);

        let cleared = subscription.try_recv().unwrap();
        assert_eq!(cleared.kind, CartEventKind::Cleared);
        assert_eq!(cleared.item_count, 0);

        // Empty merge publishes nothing.
        assert!(subscription.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_failed_add_publishes_nothing() {
        let (store, catalog, bus) = fixture().await;
        let mut subscription = bus.subscribe();
        let carts = CartService::new(store.as_ref(), &catalog, &bus);

        assert!(carts.add(OWNER, &pid("missing"), 1, Locale::En).await.is_err());
        assert!(subscription.try_recv().is_none());
    }
}
