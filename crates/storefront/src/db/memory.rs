//! In-process implementation of every store trait.
//!
//! Used by the test suites and by `BRANA_STORAGE=memory` for local work
//! without `PostgreSQL`. Semantics follow the SQL implementations; nothing is
//! persisted across restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use brana_core::{
    Cart, CartLineItem, Email, Locale, MessageId, Order, OrderId, OrderStatus, ProductId,
    SubscriberId, UserId, UserRole,
};

use super::{CartStore, MessageStore, OrderStore, ProductStore, RepositoryError, UserStore};
use crate::models::{
    ContactMessage, NewContactMessage, NewOrder, OrderSummary, Product, SubscribeOutcome,
    Subscriber, User,
};

#[derive(Default)]
struct State {
    carts: HashMap<UserId, Cart>,
    users: Vec<(User, String)>,
    products: Vec<Product>,
    orders: Vec<Order>,
    contacts: Vec<ContactMessage>,
    subscribers: Vec<Subscriber>,
}

impl State {
    fn next_id(len: usize) -> i32 {
        i32::try_from(len).map_or(i32::MAX, |n| n.saturating_add(1))
    }

    /// Change an existing cart. Owners without a cart get an empty one back
    /// and no entry; a cart emptied by the edit is dropped.
    fn edit_cart(&mut self, owner: UserId, edit: impl FnOnce(&mut Cart)) -> Cart {
        let Some(cart) = self.carts.get_mut(&owner) else {
            return Cart::default();
        };
        edit(cart);
        let cart = cart.clone();
        if cart.is_empty() {
            self.carts.remove(&owner);
        }
        cart
    }
}

/// Every store in one `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &[T], limit: u32) -> Vec<T>
where
    T: Clone,
{
    items
        .iter()
        .rev()
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load(&self, owner: UserId) -> Result<Cart, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .carts
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_item(&self, owner: UserId, item: CartLineItem) -> Result<Cart, RepositoryError> {
        let mut state = self.state.write().await;
        let cart = state.carts.entry(owner).or_default();
        cart.add(item);
        Ok(cart.clone())
    }

    async fn set_quantity(
        &self,
        owner: UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.edit_cart(owner, |cart| cart.update_quantity(product_id, quantity)))
    }

    async fn remove_item(
        &self,
        owner: UserId,
        product_id: &ProductId,
    ) -> Result<Cart, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.edit_cart(owner, |cart| {
            cart.remove(product_id);
        }))
    }

    async fn clear(&self, owner: UserId) -> Result<(), RepositoryError> {
        self.state.write().await.carts.remove(&owner);
        Ok(())
    }

    async fn merge(
        &self,
        owner: UserId,
        items: Vec<CartLineItem>,
    ) -> Result<Cart, RepositoryError> {
        let mut state = self.state.write().await;
        let cart = state.carts.entry(owner).or_default();
        cart.merge(items);
        Ok(cart.clone())
    }

    async fn replace(
        &self,
        owner: UserId,
        items: Vec<CartLineItem>,
    ) -> Result<Cart, RepositoryError> {
        let replacement = Cart::from_items(items);
        self.state
            .write()
            .await
            .carts
            .insert(owner, replacement.clone());
        Ok(replacement)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.clone()))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|(user, _)| &user.email == email)
            .map(|(user, _)| user.clone()))
    }

    async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|(user, _)| &user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(State::next_id(state.users.len())),
            email: email.clone(),
            role,
            created_at: now,
            updated_at: now,
        };
        state.users.push((user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }

    async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        let (user, _) = state
            .users
            .iter_mut()
            .find(|(user, _)| &user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn count_by_role(&self, role: UserRole) -> Result<u64, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|(user, _)| user.role == role).count() as u64)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.active && category.is_none_or(|c| p.category == c))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(products)
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| &p.id == id).cloned())
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.products.iter_mut().find(|p| p.id == product.id) {
            *existing = product.clone();
        } else {
            state.products.push(product.clone());
        }
        Ok(())
    }

    async fn count_active(&self) -> Result<u64, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().filter(|p| p.active).count() as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut state = self.state.write().await;
        let order = Order {
            id: OrderId::new(State::next_id(state.orders.len())),
            user_id: order.user_id,
            items: order.items,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            currency: order.currency,
            totals: order.totals,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == id && o.user_id == user_id)
            .cloned())
    }

    async fn list_recent(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().await;
        let matching: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        Ok(newest_first(&matching, limit))
    }

    async fn summary(&self) -> Result<OrderSummary, RepositoryError> {
        let state = self.state.read().await;
        let mut summary = OrderSummary::default();
        for order in &state.orders {
            summary.record(order.status, 1, order.totals.total);
        }
        Ok(summary)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn save_contact(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessage, RepositoryError> {
        let mut state = self.state.write().await;
        let stored = ContactMessage {
            id: MessageId::new(State::next_id(state.contacts.len())),
            name: message.name,
            email: message.email,
            subject: message.subject,
            message: message.message,
            locale: message.locale,
            created_at: Utc::now(),
        };
        state.contacts.push(stored.clone());
        Ok(stored)
    }

    async fn list_contacts(&self, limit: u32) -> Result<Vec<ContactMessage>, RepositoryError> {
        Ok(newest_first(&self.state.read().await.contacts, limit))
    }

    async fn subscribe(
        &self,
        email: &Email,
        locale: Locale,
    ) -> Result<SubscribeOutcome, RepositoryError> {
        let mut state = self.state.write().await;
        if state.subscribers.iter().any(|s| &s.email == email) {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }
        let subscriber = Subscriber {
            id: SubscriberId::new(State::next_id(state.subscribers.len())),
            email: email.clone(),
            locale,
            created_at: Utc::now(),
        };
        state.subscribers.push(subscriber);
        Ok(SubscribeOutcome::Created)
    }

    async fn list_subscribers(&self, limit: u32) -> Result<Vec<Subscriber>, RepositoryError> {
        Ok(newest_first(&self.state.read().await.subscribers, limit))
    }

    async fn counts(&self) -> Result<(u64, u64), RepositoryError> {
        let state = self.state.read().await;
        Ok((state.contacts.len() as u64, state.subscribers.len() as u64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: &str, quantity: u32) -> CartLineItem {
        CartLineItem::new(id, format!("Item {id}"), Some(Decimal::new(450, 0)), quantity)
    }

    fn email(raw: &str) -> Email {
        Email::parse(raw).expect("valid email")
    }

    #[tokio::test]
    async fn test_carts_are_isolated_per_owner() {
        let store = MemoryStore::new();
        store.add_item(UserId::new(1), line("p1", 2)).await.unwrap();
        store.add_item(UserId::new(2), line("p2", 1)).await.unwrap();

        let first = store.load(UserId::new(1)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first.items()[0].product_id.as_str(), "p1");
        assert!(store.load(UserId::new(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_adds_quantities() {
        let store = MemoryStore::new();
        let owner = UserId::new(1);
        store.add_item(owner, line("p1", 1)).await.unwrap();

        let cart = store
            .merge(owner, vec![line("p1", 2), line("p2", 1)])
            .await
            .unwrap();
        assert_eq!(cart.get(&ProductId::from("p1")).unwrap().quantity, 3);
        assert_eq!(cart.get(&ProductId::from("p2")).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes_line() {
        let store = MemoryStore::new();
        let owner = UserId::new(1);
        store.add_item(owner, line("p1", 1)).await.unwrap();

        let cart = store
            .set_quantity(owner, &ProductId::from("p1"), 0)
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_edits_without_cart_leave_no_entry() {
        let store = MemoryStore::new();
        let owner = UserId::new(7);

        let cart = store
            .set_quantity(owner, &ProductId::from("p1"), 3)
            .await
            .unwrap();
        assert!(cart.is_empty());
        let cart = store
            .remove_item(owner, &ProductId::from("p1"))
            .await
            .unwrap();
        assert!(cart.is_empty());

        store.add_item(owner, line("p1", 1)).await.unwrap();
        store
            .remove_item(owner, &ProductId::from("p1"))
            .await
            .unwrap();

        assert!(store.state.read().await.carts.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let address = email("reader@example.com");
        store
            .create_with_password(&address, "hash", UserRole::Customer)
            .await
            .unwrap();

        let err = store
            .create_with_password(&address, "hash", UserRole::Customer)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_set_role_unknown_email_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .set_role(&email("nobody@example.com"), UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_orders_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let order = store
            .create(NewOrder {
                user_id: UserId::new(1),
                items: vec![line("p1", 1)],
                shipping_address: brana_core::ShippingAddress {
                    full_name: "Abebe Kebede".to_string(),
                    phone: "+251911000000".to_string(),
                    street: "Churchill Road".to_string(),
                    city: "Addis Ababa".to_string(),
                    region: None,
                    country: "Ethiopia".to_string(),
                },
                payment_method: brana_core::PaymentMethod::CashOnDelivery,
                currency: brana_core::CurrencyCode::default(),
                totals: brana_core::OrderTotals::compute(
                    &Cart::from_items([line("p1", 1)]),
                    &brana_core::PricingPolicy::default(),
                ),
            })
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(
            store
                .get_for_user(UserId::new(1), order.id)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .get_for_user(UserId::new(2), order.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_subscribe_twice_reports_existing() {
        let store = MemoryStore::new();
        let address = email("reader@example.com");

        assert_eq!(
            store.subscribe(&address, Locale::Am).await.unwrap(),
            SubscribeOutcome::Created
        );
        assert_eq!(
            store.subscribe(&address, Locale::En).await.unwrap(),
            SubscribeOutcome::AlreadySubscribed
        );
        assert_eq!(store.counts().await.unwrap(), (0, 1));
    }

    #[tokio::test]
    async fn test_inactive_products_are_not_listed() {
        let store = MemoryStore::new();
        let mut product = Product {
            id: ProductId::from("p1"),
            name: brana_core::LocalizedText::new("Psalter", "መዝሙር"),
            description: brana_core::LocalizedText::default(),
            price: Decimal::new(450, 0),
            image: None,
            category: "facsimiles".to_string(),
            stock: 1,
            active: true,
        };
        store.upsert(&product).await.unwrap();
        product.active = false;
        product.id = ProductId::from("p2");
        store.upsert(&product).await.unwrap();

        let listed = store.list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(store.list(Some("icons")).await.unwrap().is_empty());
        assert!(store.get(&ProductId::from("p2")).await.unwrap().is_some());
    }
}
