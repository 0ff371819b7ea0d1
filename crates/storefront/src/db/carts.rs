//! Remote cart persistence.
//!
//! One row per (account, product). Quantity increments are single `UPSERT`
//! statements, so concurrent adds and merges for the same line sum correctly.
//! Nothing guarantees a consistent snapshot across lines; last write wins.

use async_trait::async_trait;
use rust_decimal::Decimal;

use brana_core::{Cart, CartLineItem, MAX_LINE_QUANTITY, ProductId, UserId, clamp_quantity};

use super::{PgStore, RepositoryError};

/// Persistence for per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Read a user's cart (empty if they never wrote one).
    async fn load(&self, owner: UserId) -> Result<Cart, RepositoryError>;

    /// Increment the line for `item.product_id` by `item.quantity`, creating it if absent.
    async fn add_item(&self, owner: UserId, item: CartLineItem) -> Result<Cart, RepositoryError>;

    /// Set a line's quantity; zero or less deletes it. Absent lines stay absent.
    async fn set_quantity(
        &self,
        owner: UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, RepositoryError>;

    /// Delete a line if present.
    async fn remove_item(
        &self,
        owner: UserId,
        product_id: &ProductId,
    ) -> Result<Cart, RepositoryError>;

    /// Delete every line.
    async fn clear(&self, owner: UserId) -> Result<(), RepositoryError>;

    /// Fold guest items into the cart: quantities add up, display fields are
    /// only written when a line is created.
    async fn merge(
        &self,
        owner: UserId,
        items: Vec<CartLineItem>,
    ) -> Result<Cart, RepositoryError>;

    /// Overwrite the whole cart.
    async fn replace(
        &self,
        owner: UserId,
        items: Vec<CartLineItem>,
    ) -> Result<Cart, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: String,
    name: String,
    price: Option<Decimal>,
    image: Option<String>,
    quantity: i32,
}

impl TryFrom<CartLineRow> for CartLineItem {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} for {}",
                row.quantity, row.product_id
            ))
        })?;
        Ok(Self {
            product_id: ProductId::from(row.product_id.as_str()),
            name: row.name,
            price: row.price,
            image: row.image,
            quantity,
        })
    }
}

fn db_quantity(quantity: u32) -> i32 {
    i32::try_from(quantity.min(MAX_LINE_QUANTITY)).unwrap_or(i32::MAX)
}

const UPSERT_INCREMENT: &str = r"
    INSERT INTO storefront.cart_line (account_id, product_id, name, price, image, quantity)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (account_id, product_id) DO UPDATE
    SET quantity = LEAST(storefront.cart_line.quantity::BIGINT + EXCLUDED.quantity, 2147483647)::INTEGER,
        updated_at = now()
";

impl PgStore {
    async fn upsert_increment<'e, E>(
        executor: E,
        owner: UserId,
        item: &CartLineItem,
    ) -> Result<(), RepositoryError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(UPSERT_INCREMENT)
            .bind(owner)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.image.as_deref())
            .bind(db_quantity(item.quantity))
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn load(&self, owner: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT product_id, name, price, image, quantity
            FROM storefront.cart_line
            WHERE account_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(owner)
        .fetch_all(self.pool())
        .await?;

        let items = rows
            .into_iter()
            .map(CartLineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Cart::from_items(items))
    }

    async fn add_item(&self, owner: UserId, item: CartLineItem) -> Result<Cart, RepositoryError> {
        if item.quantity > 0 {
            Self::upsert_increment(self.pool(), owner, &item).await?;
        }
        self.load(owner).await
    }

    async fn set_quantity(
        &self,
        owner: UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, RepositoryError> {
        if quantity <= 0 {
            return self.remove_item(owner, product_id).await;
        }
        let quantity = db_quantity(clamp_quantity(quantity));
        sqlx::query(
            r"
            UPDATE storefront.cart_line
            SET quantity = $3, updated_at = now()
            WHERE account_id = $1 AND product_id = $2
            ",
        )
        .bind(owner)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool())
        .await?;
        self.load(owner).await
    }

    async fn remove_item(
        &self,
        owner: UserId,
        product_id: &ProductId,
    ) -> Result<Cart, RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_line WHERE account_id = $1 AND product_id = $2")
            .bind(owner)
            .bind(product_id)
            .execute(self.pool())
            .await?;
        self.load(owner).await
    }

    async fn clear(&self, owner: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_line WHERE account_id = $1")
            .bind(owner)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn merge(
        &self,
        owner: UserId,
        items: Vec<CartLineItem>,
    ) -> Result<Cart, RepositoryError> {
        let incoming = Cart::from_items(items);
        if incoming.is_empty() {
            return self.load(owner).await;
        }

        let mut tx = self.pool().begin().await?;
        for item in incoming.items() {
            Self::upsert_increment(&mut *tx, owner, item).await?;
        }
        tx.commit().await?;

        self.load(owner).await
    }

    async fn replace(
        &self,
        owner: UserId,
        items: Vec<CartLineItem>,
    ) -> Result<Cart, RepositoryError> {
        let replacement = Cart::from_items(items);

        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM storefront.cart_line WHERE account_id = $1")
            .bind(owner)
            .execute(&mut *tx)
            .await?;
        for item in replacement.items() {
            Self::upsert_increment(&mut *tx, owner, item).await?;
        }
        tx.commit().await?;

        Ok(replacement)
    }
}
